//! SiliconCloud LLM adapter
//!
//! Calls SiliconCloud's OpenAI-compatible HTTP API for chat completions and
//! text embeddings, validating responses and retrying transient failures.
//!
//! ## Features
//!
//! - **Embeddings**: character-truncated batch embedding with order-preserving results
//! - **Chat completions**: system prompt, history and an open option bag forwarded to the provider
//! - **Retry policy**: bounded exponential backoff keyed on error classification
//! - **Usage tracking**: token counts forwarded to a pluggable tracker
//! - **Keyword extraction**: reduce a reply to its first embedded JSON object
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use siliconcloud_llm::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("siliconcloud.toml")?;
//!
//!     let embedder = EmbeddingClient::new(config.embedding.clone())?;
//!     let vectors = embedder.embed(&["hello world".to_string()]).await?;
//!     println!("dimension = {}", vectors[0].len());
//!
//!     let tracker = Arc::new(TokenTracker::new());
//!     let chat = ChatClient::new(config.chat)?;
//!     let reply = chat
//!         .complete_if_cache(
//!             "Qwen/Qwen2.5-7B-Instruct",
//!             "Name three rivers as JSON",
//!             Some("You answer in JSON"),
//!             &[],
//!             CompletionOptions::new()
//!                 .with_token_tracker(tracker.clone())
//!                 .with_keyword_extraction(true),
//!         )
//!         .await?;
//!     println!("{} ({} tokens)", reply, tracker.summary().total_tokens);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod http;
pub mod llm;
pub mod observability;
pub mod retry;
pub mod text;
pub mod usage;
pub mod validator;

pub use config::Config;
pub use error::{AdapterError, ClassifiedError, ErrorKind, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::embedding::{EmbeddingClient, EmbeddingProvider};
    pub use crate::error::{AdapterError, ClassifiedError, ErrorKind, Result};
    pub use crate::llm::{ChatClient, ChatMessage, CompletionOptions, LlmProvider, Role};
    pub use crate::retry::RetryPolicy;
    pub use crate::usage::{TokenCounts, TokenTracker, UsageTracker};
}
