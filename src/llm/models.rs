//! Chat messages and per-call options

use crate::usage::UsageTracker;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Option keys consumed by the adapter and never forwarded to the provider
pub const RESERVED_OPTION_KEYS: [&str; 5] = ["hashing_kv", "base_url", "api_key", "stream", "keyword_extraction"];

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Assemble the message list: system prompt, then history, then the prompt
pub fn build_messages(prompt: &str, system_prompt: Option<&str>, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(system));
    }
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(prompt));
    messages
}

/// Per-call options for a chat completion.
///
/// `extra` is the open option bag: everything in it except
/// [`RESERVED_OPTION_KEYS`] is copied into the request body.
#[derive(Clone, Default)]
pub struct CompletionOptions {
    /// Endpoint override for this call
    pub base_url: Option<String>,
    /// Credential override for this call
    pub api_key: Option<Secret<String>>,
    /// Receives token usage of a successful call
    pub token_tracker: Option<Arc<dyn UsageTracker>>,
    /// Return the first JSON object of the reply instead of the full text
    pub keyword_extraction: bool,
    pub extra: IndexMap<String, Value>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    pub fn with_token_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.token_tracker = Some(tracker);
        self
    }

    pub fn with_keyword_extraction(mut self, enabled: bool) -> Self {
        self.keyword_extraction = enabled;
        self
    }

    /// Options forwarded verbatim into the request body
    pub fn payload_options(&self) -> Map<String, Value> {
        self.extra
            .iter()
            .filter(|(key, _)| !RESERVED_OPTION_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Total request timeout from `timeout` (seconds), if set and positive
    pub fn timeout(&self) -> Option<Duration> {
        self.extra
            .get("timeout")
            .and_then(Value::as_f64)
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Model named by `hashing_kv.global_config.llm_model_name`
    pub fn model_name(&self) -> Option<&str> {
        self.extra
            .get("hashing_kv")
            .and_then(|kv| kv.pointer("/global_config/llm_model_name"))
            .and_then(Value::as_str)
    }

    /// Endpoint override, from the typed field or the option bag
    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url.clone().or_else(|| {
            self.extra.get("base_url").and_then(Value::as_str).map(str::to_string)
        })
    }

    /// Keyword mode, from the typed flag or a `keyword_extraction` bag entry
    pub fn keyword_extraction_enabled(&self) -> bool {
        self.keyword_extraction
            || self.extra.get("keyword_extraction").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Credential override, from the typed field or the option bag
    pub fn resolved_api_key(&self) -> Option<String> {
        match &self.api_key {
            Some(key) => Some(key.expose_secret().clone()),
            None => self.extra.get("api_key").and_then(Value::as_str).map(str::to_string),
        }
    }
}

impl fmt::Debug for CompletionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionOptions")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("token_tracker", &self.token_tracker.is_some())
            .field("keyword_extraction", &self.keyword_extraction_enabled())
            .field("extra", &self.payload_options())
            .finish()
    }
}
