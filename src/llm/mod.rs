//! Chat completions against the SiliconCloud chat endpoint

pub mod client;
pub mod models;
pub mod stream;

pub use client::ChatClient;
pub use models::{build_messages, ChatMessage, CompletionOptions, Role};

use async_trait::async_trait;
use crate::error::Result;

/// Uniform completion entry point used by the calling framework
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt`, taking the model from
    /// `options.extra["hashing_kv"]["global_config"]["llm_model_name"]`
    /// when present.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String>;
}
