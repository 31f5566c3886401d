//! Shared request plumbing: endpoint paths, credentials, client construction

use crate::error::{AdapterError, Result};
use reqwest::Client;
use std::time::Duration;

/// `User-Agent` sent with chat requests
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Make sure `base_url` ends with `/{path}`. Already-normalised URLs are
/// returned unchanged.
pub fn normalize_endpoint(base_url: &str, path: &str) -> String {
    let suffix = format!("/{}", path);
    if base_url.ends_with(&suffix) {
        base_url.to_string()
    } else if base_url.ends_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}{}", base_url, suffix)
    }
}

/// Prefix a key with `Bearer ` unless it already carries the prefix
pub fn bearer_token(api_key: &str) -> String {
    if api_key.starts_with("Bearer ") {
        api_key.to_string()
    } else {
        format!("Bearer {}", api_key)
    }
}

/// Build an HTTP client with a total request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AdapterError::Config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_embeddings_endpoint() {
        assert_eq!(
            normalize_endpoint("https://api.siliconflow.cn/v1", "embeddings"),
            "https://api.siliconflow.cn/v1/embeddings"
        );
        assert_eq!(
            normalize_endpoint("https://api.siliconflow.cn/v1/", "embeddings"),
            "https://api.siliconflow.cn/v1/embeddings"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for base in ["https://x.test/v1", "https://x.test/v1/", "https://x.test/v1/chat/completions"] {
            let once = normalize_endpoint(base, "chat/completions");
            assert_eq!(normalize_endpoint(&once, "chat/completions"), once);
        }
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("sk-1"), "Bearer sk-1");
        assert_eq!(bearer_token("Bearer sk-1"), "Bearer sk-1");
    }

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("siliconcloud-llm/"));
    }
}
