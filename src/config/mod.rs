//! Configuration for the SiliconCloud adapter

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use secrecy::{Secret, ExposeSecret};

pub mod loader;
pub mod validation;

/// Default SiliconCloud embeddings endpoint
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.siliconflow.cn/v1/embeddings";

/// Default SiliconCloud chat completions endpoint
pub const DEFAULT_CHAT_URL: &str = "https://api.siliconflow.cn/v1/chat/completions";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "netease-youdao/bce-embedding-base_v1";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the embeddings endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Endpoint URL, normalised to end in `/embeddings`
    #[serde(default = "default_embedding_url")]
    pub base_url: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key, with or without the `Bearer ` prefix
    #[serde(default, serialize_with = "serialize_optional_secret", deserialize_with = "deserialize_optional_secret")]
    pub api_key: Option<Secret<String>>,

    /// Per-text truncation limit, counted in characters
    #[serde(default = "default_max_token_size")]
    pub max_token_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "RetryConfig::embedding")]
    pub retry: RetryConfig,
}

/// Configuration for the chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Endpoint URL, normalised to end in `/chat/completions`
    #[serde(default = "default_chat_url")]
    pub base_url: String,

    /// Model used when the caller does not name one
    #[serde(default)]
    pub model: Option<String>,

    /// API key, with or without the `Bearer ` prefix
    #[serde(default, serialize_with = "serialize_optional_secret", deserialize_with = "deserialize_optional_secret")]
    pub api_key: Option<Secret<String>>,

    /// Total request timeout in seconds, overridden per call by `options.timeout`
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "RetryConfig::chat")]
    pub retry: RetryConfig,
}

/// Exponential backoff settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Backoff multiplier in seconds
    pub multiplier_secs: f64,

    /// Lower bound of the wait between attempts, in seconds
    pub min_wait_secs: f64,

    /// Upper bound of the wait between attempts, in seconds
    pub max_wait_secs: f64,
}

impl RetryConfig {
    pub fn embedding() -> Self {
        Self {
            max_attempts: 3,
            multiplier_secs: 1.0,
            min_wait_secs: 4.0,
            max_wait_secs: 60.0,
        }
    }

    pub fn chat() -> Self {
        Self {
            max_attempts: 3,
            multiplier_secs: 1.0,
            min_wait_secs: 4.0,
            max_wait_secs: 10.0,
        }
    }

    /// Retry settings that never sleep, for tests and local tooling
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier_secs: 0.0,
            min_wait_secs: 0.0,
            max_wait_secs: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, compact or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_embedding_url() -> String { DEFAULT_EMBEDDING_URL.to_string() }
fn default_chat_url() -> String { DEFAULT_CHAT_URL.to_string() }
fn default_embedding_model() -> String { DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_max_token_size() -> usize { 8192 }
fn default_embedding_timeout() -> u64 { 60 }
fn default_chat_timeout() -> u64 { 300 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_url(),
            model: default_embedding_model(),
            api_key: None,
            max_token_size: default_max_token_size(),
            timeout_secs: default_embedding_timeout(),
            retry: RetryConfig::embedding(),
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_url(),
            model: None,
            api_key: None,
            timeout_secs: default_chat_timeout(),
            retry: RetryConfig::chat(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config_with_env(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Validate this configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validation::validate_config(self)
    }

    /// Create default configuration, reading the key from `SILICONCLOUD_API_KEY`
    pub fn default_config() -> Self {
        let api_key = std::env::var("SILICONCLOUD_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Secret::new);

        Self {
            embedding: EmbeddingConfig {
                api_key: api_key.clone(),
                ..EmbeddingConfig::default()
            },
            chat: ChatConfig {
                api_key,
                ..ChatConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }
}

/// Custom serializer for Option<Secret<String>>
fn serialize_optional_secret<S>(secret: &Option<Secret<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Custom deserializer for Option<Secret<String>>
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.is_empty()).map(Secret::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_presets() {
        let embedding = RetryConfig::embedding();
        assert_eq!(embedding.max_attempts, 3);
        assert_eq!(embedding.min_wait_secs, 4.0);
        assert_eq!(embedding.max_wait_secs, 60.0);

        let chat = RetryConfig::chat();
        assert_eq!(chat.max_wait_secs, 10.0);
    }

    #[test]
    fn test_deserialize_minimal_toml() {
        let raw = r#"
            [embedding]
            api_key = "sk-test"

            [chat]
            model = "Qwen/Qwen2.5-7B-Instruct"
        "#;

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.embedding.base_url, DEFAULT_EMBEDDING_URL);
        assert_eq!(cfg.embedding.max_token_size, 8192);
        assert_eq!(cfg.embedding.api_key.as_ref().unwrap().expose_secret(), "sk-test");
        assert_eq!(cfg.embedding.retry, RetryConfig::embedding());
        assert_eq!(cfg.chat.model.as_deref(), Some("Qwen/Qwen2.5-7B-Instruct"));
        assert!(cfg.chat.api_key.is_none());
        assert_eq!(cfg.chat.timeout_secs, 300);
        assert_eq!(cfg.chat.retry, RetryConfig::chat());
        assert_eq!(cfg.logging.format, "pretty");
    }
}
