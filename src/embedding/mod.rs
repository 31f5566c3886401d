//! Embedding calls against the SiliconCloud embeddings endpoint

pub mod client;
pub mod models;

pub use client::EmbeddingClient;
pub use models::EmbeddingRequest;

use async_trait::async_trait;
use crate::error::Result;

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per text, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text
    async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            crate::error::ClassifiedError::malformed("No embedding in response").into()
        })
    }
}
