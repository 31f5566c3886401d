//! Chat completion client for the SiliconCloud API

use super::models::{build_messages, ChatMessage, CompletionOptions};
use super::LlmProvider;
use crate::config::ChatConfig;
use crate::error::{AdapterError, ClassifiedError, Result};
use crate::http::{bearer_token, build_client, normalize_endpoint, USER_AGENT};
use crate::retry::RetryPolicy;
use crate::text::{decode_unicode_escapes, extract_first_json_object};
use crate::usage::{record_usage, UsageTracker};
use crate::validator::{ChatCompletion, ResponseValidator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Endpoint path appended to chat base URLs
const CHAT_PATH: &str = "chat/completions";

/// Client for chat completions via the SiliconCloud API
pub struct ChatClient {
    config: ChatConfig,
    http_client: Client,
    retry: RetryPolicy,
}

/// Everything one attempt needs, built once per call
struct PreparedRequest {
    url: String,
    authorization: Option<String>,
    payload: Value,
    timeout: Duration,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: ChatConfig) -> Result<Self> {
        let http_client = build_client(config.timeout())?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Create client with custom HTTP client
    pub fn with_http_client(config: ChatConfig, http_client: Client) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);

        info!(
            "Initialized chat client for {} (default model={:?})",
            normalize_endpoint(&config.base_url, CHAT_PATH),
            config.model
        );

        Self {
            config,
            http_client,
            retry,
        }
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint for a call, honouring a per-call base URL
    pub fn endpoint(&self, base_url: Option<&str>) -> String {
        normalize_endpoint(base_url.unwrap_or(&self.config.base_url), CHAT_PATH)
    }

    /// Run a chat completion against `model`.
    ///
    /// Streaming is never requested; the reply is returned as one string.
    pub async fn complete_if_cache(
        &self,
        model: &str,
        prompt: &str,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String> {
        let messages = build_messages(prompt, system_prompt, history);
        let prepared = self.prepare(model, messages, &options)?;

        debug!("===== Sending query to SiliconCloud chat API =====");
        debug!("Model: {}   Base URL: {}", model, prepared.url);
        debug!("Additional options: {:?}", options);
        debug!("Num of history messages: {}", history.len());

        let tracker = options.token_tracker.as_deref();
        let keyword_extraction = options.keyword_extraction_enabled();

        self.retry
            .run("Chat completion", || self.try_request(&prepared, tracker, keyword_extraction))
            .await
    }

    fn prepare(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<PreparedRequest> {
        let url = self.endpoint(options.resolved_base_url().as_deref());

        let authorization = options
            .resolved_api_key()
            .or_else(|| self.config.api_key.as_ref().map(|k| k.expose_secret().clone()))
            .filter(|k| !k.is_empty())
            .map(|k| bearer_token(&k));

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(model.to_string()));
        payload.insert("messages".to_string(), serde_json::to_value(messages)?);
        payload.extend(options.payload_options());

        Ok(PreparedRequest {
            url,
            authorization,
            payload: Value::Object(payload),
            timeout: options.timeout().unwrap_or_else(|| self.config.timeout()),
        })
    }

    /// Single POST to the chat endpoint
    async fn try_request(
        &self,
        prepared: &PreparedRequest,
        tracker: Option<&dyn UsageTracker>,
        keyword_extraction: bool,
    ) -> Result<String> {
        let mut builder = self.http_client
            .post(&prepared.url)
            .timeout(prepared.timeout)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&prepared.payload);

        if let Some(auth) = &prepared.authorization {
            builder = builder.header("Authorization", auth);
        }

        let response = builder.send().await.map_err(|e| {
            error!("Chat API connection error: {}", e);
            ClassifiedError::from_transport(&e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read chat response body: {}", e);
            ClassifiedError::from_transport(&e)
        })?;

        if status != StatusCode::OK {
            return Err(ResponseValidator::classify_chat_status(status, &body).into());
        }

        let completion = ResponseValidator::validate_chat(&body)?;
        Ok(finish_completion(completion, tracker, keyword_extraction))
    }
}

/// Post-process a validated reply: unicode fix-up, usage, keyword extraction
fn finish_completion(
    completion: ChatCompletion,
    tracker: Option<&dyn UsageTracker>,
    keyword_extraction: bool,
) -> String {
    let mut content = completion.content;
    if content.contains("\\u") {
        content = decode_unicode_escapes(content.as_bytes());
    }

    record_usage(tracker, completion.usage.as_ref());

    if keyword_extraction {
        return match extract_first_json_object(&content) {
            Some(json) => json,
            None => {
                warn!("Keyword extraction found no JSON object, returning raw reply");
                content
            }
        };
    }

    debug!("Response content len: {}", content.len());
    content
}

#[async_trait]
impl LlmProvider for ChatClient {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String> {
        let model = options
            .model_name()
            .map(str::to_string)
            .or_else(|| self.config.model.clone())
            .ok_or_else(|| {
                AdapterError::InvalidInput(
                    "No model given: set hashing_kv.global_config.llm_model_name or chat.model".to_string(),
                )
            })?;

        self.complete_if_cache(&model, prompt, system_prompt, history, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::usage::TokenTracker;
    use serde_json::json;
    use std::sync::Arc;

    fn test_client() -> ChatClient {
        let config = ChatConfig {
            base_url: "https://api.example.com/v1".to_string(),
            model: Some("default-model".to_string()),
            api_key: Some(secrecy::Secret::new("sk-config".to_string())),
            timeout_secs: 300,
            retry: RetryConfig::immediate(3),
        };
        ChatClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_override() {
        let client = test_client();
        assert_eq!(client.endpoint(None), "https://api.example.com/v1/chat/completions");
        assert_eq!(
            client.endpoint(Some("https://other.test/v1/chat/completions")),
            "https://other.test/v1/chat/completions"
        );
    }

    #[test]
    fn test_prepare_payload() {
        let client = test_client();
        let options = CompletionOptions::new()
            .with_option("temperature", json!(0.1))
            .with_option("stream", json!(true))
            .with_option("timeout", json!(30))
            .with_option("hashing_kv", json!({"global_config": {}}));

        let prepared = client
            .prepare("m", build_messages("q", Some("sys"), &[]), &options)
            .unwrap();

        assert_eq!(prepared.payload["model"], "m");
        assert_eq!(prepared.payload["messages"][0]["role"], "system");
        assert_eq!(prepared.payload["messages"][1]["content"], "q");
        assert_eq!(prepared.payload["temperature"], 0.1);
        assert_eq!(prepared.payload["timeout"], 30);
        assert!(prepared.payload.get("stream").is_none());
        assert!(prepared.payload.get("hashing_kv").is_none());
        assert_eq!(prepared.timeout, Duration::from_secs(30));
        assert_eq!(prepared.authorization.as_deref(), Some("Bearer sk-config"));
    }

    #[test]
    fn test_prepare_default_timeout_and_key_override() {
        let client = test_client();
        let options = CompletionOptions::new().with_api_key("Bearer sk-call");

        let prepared = client.prepare("m", build_messages("q", None, &[]), &options).unwrap();
        assert_eq!(prepared.timeout, Duration::from_secs(300));
        assert_eq!(prepared.authorization.as_deref(), Some("Bearer sk-call"));
    }

    #[test]
    fn test_finish_decodes_escapes_and_tracks_usage() {
        let tracker = Arc::new(TokenTracker::new());
        let completion = ChatCompletion {
            content: r"caf\u00e9".to_string(),
            usage: Some(json!({"prompt_tokens": 5, "completion_tokens": 2})),
        };

        let text = finish_completion(completion, Some(tracker.as_ref()), false);
        assert_eq!(text, "café");

        let summary = tracker.summary();
        assert_eq!(summary.calls, 1);
        assert_eq!(summary.prompt_tokens, 5);
        assert_eq!(summary.completion_tokens, 2);
        assert_eq!(summary.total_tokens, 0);
    }

    #[test]
    fn test_finish_keyword_extraction() {
        let completion = ChatCompletion {
            content: r#"Here is data: {"a":1}"#.to_string(),
            usage: None,
        };
        assert_eq!(finish_completion(completion, None, true), r#"{"a":1}"#);

        let completion = ChatCompletion {
            content: "no braces".to_string(),
            usage: None,
        };
        assert_eq!(finish_completion(completion, None, true), "no braces");
    }

    #[tokio::test]
    async fn test_complete_requires_model() {
        let mut config = test_client().config.clone();
        config.model = None;
        let client = ChatClient::new(config).unwrap();

        let err = client
            .complete("q", None, &[], CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(_)));
    }
}
