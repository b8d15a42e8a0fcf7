//! OpenAI-compatible API backend implementation.
//!
//! `OpenAiBackend` talks to OpenAI's chat completions endpoint or any
//! compatible service (Groq, Ollama, local servers).

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{LlmBackend, SharedBackend, with_retry};
use crate::error::{LlmError, RateLimitInfo, Result};
use crate::types::{CompletionRequest, CompletionResponse, ContentBlock, StopReason, Usage};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication (optional for local services like Ollama).
    pub api_key: Option<String>,

    /// Environment variable the key is expected in. When set and `api_key` is
    /// missing, requests fail with a configuration error naming the variable.
    pub api_key_env: Option<String>,

    /// Base URL for the API.
    pub base_url: String,

    /// Model to use (overrides the request model when set).
    pub model: Option<String>,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient errors.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,

    /// Name for this backend instance.
    pub name: String,
}

impl OpenAiConfig {
    /// Create a config for OpenAI.
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            api_key,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            base_url: DEFAULT_OPENAI_BASE.to_string(),
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
            name: "openai".to_string(),
        }
    }

    /// Create a config for Groq.
    pub fn groq(api_key: Option<String>) -> Self {
        Self {
            api_key_env: Some("GROQ_API_KEY".to_string()),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            name: "groq".to_string(),
            ..Self::openai(api_key)
        }
    }

    /// Create a config for Ollama (local, no key).
    pub fn ollama() -> Self {
        Self {
            api_key_env: None,
            base_url: "http://localhost:11434/v1".to_string(),
            timeout: Duration::from_secs(600),
            name: "ollama".to_string(),
            ..Self::openai(None)
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the backend name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Backend
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible API backend.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a new OpenAI-compatible backend with the given configuration.
    ///
    /// A missing API key is not an error here; it surfaces on the first
    /// request so callers that never reach the model do not need a key.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn check_api_key(&self) -> Result<()> {
        match (&self.config.api_key, &self.config.api_key_env) {
            (None, Some(var)) => Err(LlmError::Config(format!(
                "{} environment variable not set",
                var
            ))),
            _ => Ok(()),
        }
    }

    /// Add authentication headers to a request.
    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(header::CONTENT_TYPE, "application/json");

        if let Some(ref api_key) = self.config.api_key {
            builder.header(header::AUTHORIZATION, format!("Bearer {}", api_key))
        } else {
            builder
        }
    }

    /// Convert our CompletionRequest to OpenAI-compatible format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAiChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        let model = self
            .config
            .model
            .clone()
            .unwrap_or_else(|| request.model.clone());

        OpenAiChatRequest {
            model,
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
        }
    }

    /// Handle a successful response.
    async fn handle_response(response: Response) -> Result<CompletionResponse> {
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body = response.text().await?;
        let parsed: OpenAiChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Serialization(e.to_string()))?;

        CompletionResponse::try_from(parsed)
    }

    /// Handle an error response.
    async fn handle_error_response(response: Response) -> LlmError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

        match status.as_u16() {
            401 => LlmError::Auth(format!("Authentication failed: {}", message)),
            429 => LlmError::RateLimit(RateLimitInfo::parse_openai(
                &message,
                retry_after.as_deref(),
            )),
            500..=599 => LlmError::Backend(format!("Server error: {}", message)),
            _ => LlmError::Backend(message),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.check_api_key()?;

        let openai_request = self.to_openai_request(&request);

        tracing::debug!(
            backend = %self.config.name,
            model = %openai_request.model,
            messages = %openai_request.messages.len(),
            "Sending OpenAI-compatible request"
        );

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .add_headers(self.client.post(self.completions_url()))
                    .json(&openai_request)
                    .send()
                    .await?;

                Self::handle_response(response).await
            },
        )
        .await
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

/// Create a shared OpenAI-compatible backend.
pub fn create_shared_backend(config: OpenAiConfig) -> Result<SharedBackend> {
    Ok(Arc::new(OpenAiBackend::new(config)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, serde::Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiChatResponse {
    id: String,
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<OpenAiUsage>,
}

impl TryFrom<OpenAiChatResponse> for CompletionResponse {
    type Error = LlmError;

    fn try_from(resp: OpenAiChatResponse) -> Result<Self> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Serialization("response contained no choices".to_string()))?;

        let content = choice
            .message
            .content
            .filter(|text| !text.is_empty())
            .map(|text| vec![ContentBlock::Text { text }])
            .unwrap_or_default();

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        let usage = resp
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse::new(
            resp.id,
            resp.model,
            content,
            stop_reason,
            usage,
        ))
    }
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn test_openai_config() {
        let config = OpenAiConfig::openai(Some("sk-test".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE);
        assert_eq!(config.name, "openai");
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_groq_and_ollama_configs() {
        let groq = OpenAiConfig::groq(None);
        assert_eq!(groq.api_key_env.as_deref(), Some("GROQ_API_KEY"));
        assert!(groq.base_url.contains("groq.com"));

        let ollama = OpenAiConfig::ollama();
        assert!(ollama.api_key.is_none());
        assert!(ollama.api_key_env.is_none());
        assert_eq!(ollama.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::openai(None)
            .with_base_url("http://localhost:8080/v1/")
            .with_model("gpt-4o-mini")
            .with_name("custom")
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(2);

        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.name, "custom");
        assert_eq!(config.max_retries, 2);

        let backend = OpenAiBackend::new(config).unwrap();
        assert_eq!(
            backend.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(backend.name(), "custom");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let backend = OpenAiBackend::new(OpenAiConfig::openai(None)).unwrap();
        let request = CompletionRequest::new("gpt-3.5-turbo", vec![Message::user("hi")], 10);

        let err = backend.complete(request).await.unwrap_err();
        match err {
            LlmError::Config(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_to_openai_request() {
        let backend = OpenAiBackend::new(OpenAiConfig::openai(Some("k".to_string()))).unwrap();
        let request = CompletionRequest::new("gpt-3.5-turbo", vec![Message::user("Study this")], 512)
            .with_temperature(0.1);

        let converted = backend.to_openai_request(&request);
        assert_eq!(converted.model, "gpt-3.5-turbo");
        assert_eq!(converted.messages.len(), 1);
        assert_eq!(converted.messages[0].role, "user");
        assert_eq!(converted.messages[0].content, "Study this");
        assert_eq!(converted.max_tokens, Some(512));
        assert_eq!(converted.temperature, Some(0.1));
    }

    #[test]
    fn test_config_model_overrides_request_model() {
        let config = OpenAiConfig::openai(Some("k".to_string())).with_model("gpt-4o");
        let backend = OpenAiBackend::new(config).unwrap();
        let request = CompletionRequest::new("gpt-3.5-turbo", vec![Message::user("x")], 1);
        assert_eq!(backend.to_openai_request(&request).model, "gpt-4o");
    }

    #[test]
    fn test_openai_response_conversion() {
        let json = r#"{
            "id": "chatcmpl-123",
            "model": "gpt-3.5-turbo",
            "choices": [{
                "message": {"role": "assistant", "content": "Here is your guide."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5}
        }"#;

        let parsed: OpenAiChatResponse = serde_json::from_str(json).unwrap();
        let response = CompletionResponse::try_from(parsed).unwrap();

        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.text(), "Here is your guide.");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.usage, Usage::new(12, 5));
    }

    #[test]
    fn test_openai_response_truncated() {
        let json = r#"{
            "id": "x",
            "model": "m",
            "choices": [{"message": {"content": "partial"}, "finish_reason": "length"}]
        }"#;

        let parsed: OpenAiChatResponse = serde_json::from_str(json).unwrap();
        let response = CompletionResponse::try_from(parsed).unwrap();
        assert_eq!(response.stop_reason, Some(StopReason::MaxTokens));
        assert_eq!(response.usage, Usage::default());
    }

    #[test]
    fn test_openai_response_without_choices_is_error() {
        let json = r#"{"id": "x", "model": "m", "choices": []}"#;

        let parsed: OpenAiChatResponse = serde_json::from_str(json).unwrap();
        let err = CompletionResponse::try_from(parsed).unwrap_err();
        assert!(matches!(err, LlmError::Serialization(ref msg) if msg.contains("no choices")));
    }

    #[test]
    fn test_openai_response_null_content_is_empty() {
        let json = r#"{
            "id": "x",
            "model": "m",
            "choices": [{"message": {"content": null}, "finish_reason": "stop"}]
        }"#;

        let parsed: OpenAiChatResponse = serde_json::from_str(json).unwrap();
        let response = CompletionResponse::try_from(parsed).unwrap();
        assert!(response.text().is_empty());
    }
}
