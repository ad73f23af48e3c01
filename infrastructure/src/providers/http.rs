//! Backend for OpenAI-compatible chat completion endpoints.
//!
//! Works against anything that speaks `/chat/completions`: hosted APIs,
//! aggregators such as OpenRouter, or local servers (vLLM, Ollama).

use async_trait::async_trait;
use council_application::ports::backend::{
    BackendError, BackendReply, ModelBackend, QueryOptions,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

/// API error response (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Connection settings for one model on one endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub model: String,
    pub base_url: String,
    /// `None` for local endpoints without auth
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl HttpBackendConfig {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_tokens: None,
        }
    }
}

pub struct HttpBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Other(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|_| BackendError::Other("API key is not a valid header".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn map_send_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.config.timeout)
        } else if error.is_connect() {
            BackendError::Connection(error.to_string())
        } else {
            BackendError::RequestFailed(error.to_string())
        }
    }
}

/// Pull the answer text, reported model and token usage out of a 2xx body.
fn parse_completion(body: &str) -> Result<(String, Option<String>, Option<u64>), BackendError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {e}")))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| BackendError::InvalidResponse("No choices in response".to_string()))?;

    let tokens = response.usage.and_then(|u| u.total_tokens);
    Ok((text, response.model, tokens))
}

/// Describe a non-2xx response, preferring the OpenAI error envelope.
fn describe_error(status: u16, body: &str) -> BackendError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_error) => api_error.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => council_domain::util::truncate_str(body.trim(), 300).to_string(),
    };
    BackendError::RequestFailed(format!("HTTP {status}: {message}"))
}

#[async_trait]
impl ModelBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<BackendReply, BackendError> {
        options.check_cancelled()?;
        let started = Instant::now();

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content: options.render_prompt(prompt)?,
            }],
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, url = %self.endpoint(), "Sending chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(describe_error(status.as_u16(), &body));
        }

        let (text, reported_model, tokens) = parse_completion(&body)?;
        let source_id = reported_model.unwrap_or_else(|| self.config.model.clone());
        Ok(BackendReply::new(text, source_id, started.elapsed()).with_tokens_used(tokens))
    }
}
