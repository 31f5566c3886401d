//! Embedding client for the SiliconCloud API

use super::{EmbeddingProvider, models::*};
use crate::config::EmbeddingConfig;
use crate::error::{AdapterError, ClassifiedError, Result};
use crate::http::{bearer_token, build_client, normalize_endpoint};
use crate::retry::RetryPolicy;
use crate::validator::ResponseValidator;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, error, info};

/// Client for generating embeddings via the SiliconCloud API
pub struct EmbeddingClient {
    config: EmbeddingConfig,
    http_client: Client,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let http_client = build_client(config.timeout())?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Create client with custom HTTP client
    pub fn with_http_client(config: EmbeddingConfig, http_client: Client) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);

        info!(
            "Initialized embedding client for {} (model={}, max_token_size={})",
            normalize_endpoint(&config.base_url, "embeddings"),
            config.model,
            config.max_token_size
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

    /// Endpoint the client posts to
    pub fn endpoint(&self) -> String {
        normalize_endpoint(&self.config.base_url, "embeddings")
    }

    /// Embed `texts`, returning one vector per text in input order
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(AdapterError::InvalidInput("Texts cannot be empty".to_string()));
        }

        let url = self.endpoint();
        let request = EmbeddingRequest::new(&self.config.model, texts, self.config.max_token_size);

        debug!("Embedding {} texts with model {}", texts.len(), request.model);

        self.retry
            .run("Embedding request", || self.try_request(&url, &request))
            .await
    }

    /// Single POST to the embeddings endpoint
    async fn try_request(&self, url: &str, request: &EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
        let mut builder = self.http_client
            .post(url)
            .header("Content-Type", "application/json")
            .json(request);

        let key = self.config.api_key.as_ref().filter(|k| !k.expose_secret().is_empty());
        if let Some(key) = key {
            builder = builder.header("Authorization", bearer_token(key.expose_secret()));
        }

        let response = builder.send().await.map_err(|e| {
            error!("Embedding API connection error: {}", e);
            ClassifiedError::from_transport(&e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read embedding response body: {}", e);
            ClassifiedError::from_transport(&e)
        })?;

        if status != StatusCode::OK {
            return Err(ResponseValidator::classify_embedding_status(status, &body).into());
        }

        Ok(ResponseValidator::validate_embeddings(&body, request.input.len())?)
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::error::ErrorKind;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(base_url: String) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url,
            model: "BAAI/bge-m3".to_string(),
            api_key: Some(secrecy::Secret::new("sk-test".to_string())),
            max_token_size: 4,
            timeout_secs: 5,
            retry: RetryConfig::immediate(3),
        }
    }

    #[test]
    fn test_endpoint_normalization() {
        let client = EmbeddingClient::new(test_config("https://api.example.com/v1/".to_string())).unwrap();
        assert_eq!(client.endpoint(), "https://api.example.com/v1/embeddings");
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let client = EmbeddingClient::new(test_config("http://127.0.0.1:9".to_string())).unwrap();
        let err = client.embed(&[]).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_sends_truncated_inputs_with_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .match_header("authorization", "Bearer sk-test")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "model": "BAAI/bge-m3",
                "input": ["abcd", "xy"],
                "encoding_format": "float"
            })))
            .with_status(200)
            .with_body(r#"{"data": [{"embedding": [1.0, 0.0]}, {"embedding": [0.0, 1.0]}]}"#)
            .create_async()
            .await;

        let client = EmbeddingClient::new(test_config(format!("{}/v1", server.url()))).unwrap();
        let vectors = client
            .embed(&["abcdefgh".to_string(), "xy".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_key_sends_no_authorization() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"data": [{"embedding": [0.25]}]}"#)
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.api_key = Some(secrecy::Secret::new(String::new()));
        let client = EmbeddingClient::new(config).unwrap();

        assert_eq!(client.embed(&["hi".to_string()]).await.unwrap(), vec![vec![0.25]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .with_status(404)
            .with_body("no such route")
            .expect(1)
            .create_async()
            .await;

        let client = EmbeddingClient::new(test_config(server.url())).unwrap();
        let err = client.embed(&["text".to_string()]).await.unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::EndpointNotFound));
        assert!(err.to_string().contains("no such route"));
        mock.assert_async().await;
    }
}
