//! Data models for embedding requests

use serde::{Deserialize, Serialize};

/// Body of a POST to the embeddings endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model identifier
    pub model: String,

    /// Input texts, already truncated
    pub input: Vec<String>,

    /// Always `"float"`
    pub encoding_format: String,
}

impl EmbeddingRequest {
    /// Build a request, truncating each text to `max_chars` characters
    pub fn new(model: impl Into<String>, texts: &[String], max_chars: usize) -> Self {
        Self {
            model: model.into(),
            input: texts.iter().map(|t| truncate_chars(t, max_chars)).collect(),
            encoding_format: "float".to_string(),
        }
    }
}

/// Keep the first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
