//! Advisory oracle: free-text buying advice from an OpenAI-compatible chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use courtside_core::config::LlmConfig;
use courtside_core::domain::item::{SurfacePreference, Tier};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::AdvisoryPrompt;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("advisory request timed out")]
    Timeout,
    #[error("advisory transport failure: {0}")]
    TransportFailure(String),
    #[error("advisory response was malformed: {0}")]
    MalformedResponse(String),
    #[error("advisory service rejected credentials: {0}")]
    AuthFailure(String),
}

#[async_trait]
pub trait AdvisoryOracle: Send + Sync {
    async fn advise(&self, tier: Tier, surface: SurfacePreference) -> Result<String, OracleError>;
}

#[derive(Clone)]
pub struct OpenAiOracle {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiOracle {
    /// `endpoint_base` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(endpoint_base: impl AsRef<str>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", endpoint_base.as_ref().trim_end_matches('/')),
            api_key: None,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 300,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        let oracle = Self::new(config.endpoint_base(), config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_timeout(Duration::from_secs(config.timeout_secs));
        match &config.api_key {
            Some(key) => oracle.with_api_key(key.clone()),
            None => oracle,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, prompt: AdvisoryPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system", content: prompt.system },
                ChatMessage { role: "user", content: prompt.user },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, OracleError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                OracleError::Timeout
            } else {
                OracleError::TransportFailure(format!("chat completion request failed: {err}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| OracleError::MalformedResponse(format!("invalid body: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl AdvisoryOracle for OpenAiOracle {
    async fn advise(&self, tier: Tier, surface: SurfacePreference) -> Result<String, OracleError> {
        let request = self.build_request(AdvisoryPrompt::for_selection(tier, surface));

        match tokio::time::timeout(self.timeout, self.send_request(&request)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, OracleError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_owned())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| OracleError::MalformedResponse("no content in completion".to_string()))
}

fn map_http_error(status: StatusCode, body: &str) -> OracleError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OracleError::AuthFailure(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => OracleError::Timeout,
        other => OracleError::TransportFailure(format!("status {}: {message}", other.as_u16())),
    }
}
