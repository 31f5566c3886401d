//! Response validation
//!
//! Turns raw status codes and response bodies into either a payload or a
//! [`ClassifiedError`]. Every failure is logged before it is returned.

use crate::error::ClassifiedError;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

/// A validated chat completion body
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    /// Reply text of the first choice, guaranteed non-blank
    pub content: String,
    /// Raw `usage` object, if the provider sent one
    pub usage: Option<Value>,
}

/// Response validator
pub struct ResponseValidator;

impl ResponseValidator {
    /// Classify a non-200 embeddings response
    pub fn classify_embedding_status(status: StatusCode, body: &str) -> ClassifiedError {
        error!("Embedding API error {}: {}", status.as_u16(), body);

        match status {
            StatusCode::NOT_FOUND => {
                ClassifiedError::not_found(format!("Embedding API endpoint not found: {}", body))
            }
            StatusCode::UNAUTHORIZED => {
                ClassifiedError::auth_failed(format!("Invalid API key: {}", body))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                ClassifiedError::rate_limited(format!("Rate limit exceeded: {}", body))
            }
            _ => ClassifiedError::unclassified(format!("HTTP {}: {}", status.as_u16(), body)),
        }
    }

    /// Classify a non-200 chat completions response
    pub fn classify_chat_status(status: StatusCode, body: &str) -> ClassifiedError {
        error!("Chat API error {}: {}", status.as_u16(), body);

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                ClassifiedError::rate_limited(format!("Rate limit exceeded: {}", body))
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                ClassifiedError::server_transient(format!("Server error {}: {}", status.as_u16(), body))
            }
            _ => ClassifiedError::unclassified(format!("HTTP {}: {}", status.as_u16(), body)),
        }
    }

    /// Validate an embeddings body and extract one vector per input
    pub fn validate_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, ClassifiedError> {
        let content: Value = serde_json::from_str(body).map_err(|e| {
            error!("Failed to parse embedding response: {}", e);
            ClassifiedError::malformed(format!("Invalid JSON response: {}", body))
        })?;

        if let Some(err) = content.get("error") {
            error!("Embedding API error payload: {}", err);
            return Err(ClassifiedError::malformed(format!("API Error: {}", err)));
        }

        if content.get("code").is_some() {
            error!("Embedding API error code: {}", content);
            return Err(ClassifiedError::malformed(format!("API Error Code: {}", content)));
        }

        let data = match content.get("data").and_then(Value::as_array) {
            Some(data) if !data.is_empty() => data,
            _ => {
                error!("Invalid embedding response: no data found");
                return Err(ClassifiedError::malformed("Invalid response: no data found"));
            }
        };

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let Some(raw) = item.get("embedding") else {
                error!("Invalid embedding response: no embedding found in data item");
                return Err(ClassifiedError::malformed(
                    "Invalid response: no embedding found in data item",
                ));
            };

            let vector: Vec<f32> = serde_json::from_value(raw.clone()).map_err(|e| {
                error!("Embedding is not a numeric array: {}", e);
                ClassifiedError::malformed(format!("Invalid embedding values: {}", e))
            })?;
            embeddings.push(vector);
        }

        if embeddings.len() != expected {
            error!(
                "Embedding count mismatch: sent {} inputs, received {} vectors",
                expected,
                embeddings.len()
            );
            return Err(ClassifiedError::malformed(format!(
                "Invalid response: expected {} embeddings, got {}",
                expected,
                embeddings.len()
            )));
        }

        debug!("Received {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    /// Validate a non-streaming chat completion body
    pub fn validate_chat(body: &str) -> Result<ChatCompletion, ClassifiedError> {
        let content: Value = serde_json::from_str(body).map_err(|e| {
            error!("Failed to parse chat response: {}", e);
            ClassifiedError::malformed(format!("Invalid JSON response: {}", e))
        })?;

        if let Some(err) = content.get("error") {
            error!("Chat API error payload: {}", err);
            return Err(ClassifiedError::malformed(format!("API Error: {}", err)));
        }

        let first_choice = content
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first());

        let Some(choice) = first_choice else {
            error!("Invalid chat response: no choices found");
            return Err(ClassifiedError::malformed("Invalid response: no choices found"));
        };

        let Some(text) = choice.pointer("/message/content").and_then(Value::as_str) else {
            error!("Invalid chat response: no message content found");
            return Err(ClassifiedError::malformed("Invalid response: no message content found"));
        };

        if text.trim().is_empty() {
            error!("Received empty content from chat API");
            return Err(ClassifiedError::malformed("Received empty content from chat API"));
        }

        Ok(ChatCompletion {
            content: text.to_string(),
            usage: content.get("usage").filter(|u| u.is_object()).cloned(),
        })
    }
}
