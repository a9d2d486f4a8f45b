//! OpenAI-compatible API client.

use std::time::Duration;

use helpdesk_core::GenerationSettings;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::prompt::Prompt;
use crate::providers::generator::{GenerationError, ResponseGenerator};

/// OpenAI-compatible Chat Completions client.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    /// Create a new client with the default sampling parameters.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            max_tokens: 500,
            temperature: 0.7,
        })
    }

    pub fn from_settings(
        settings: &GenerationSettings,
        api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(&settings.base_url, api_key, &settings.model)?
            .with_sampling(settings.max_tokens, settings.temperature))
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            let auth_value = format!("Bearer {}", api_key);
            if let Ok(header_value) = HeaderValue::from_str(&auth_value) {
                headers.insert(AUTHORIZATION, header_value);
            }
        }
        headers
    }

    fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    fn chat_completions_url(&self) -> String {
        let base = self.normalized_base_url();
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    async fn send(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let request_body = ChatCompletionsRequest {
            model: &self.model,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: &prompt.system,
                },
                OpenAiMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http_client
            .post(self.chat_completions_url())
            .headers(self.build_headers())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let category = classify_status(status, &error_text);
            warn!(
                "Generation API returned {} ({}): {}",
                status,
                category.as_str(),
                preview(&error_text)
            );
            return Err(category);
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let completions: ChatCompletionsResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                warn!(
                    "Failed to parse generation response: {e}; body preview: {}",
                    preview(&response_text)
                );
                GenerationError::Unknown
            })?;

        completions
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::Unknown)
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<String, GenerationError> {
        if self.api_key.is_none() {
            warn!("No generation API key configured");
            return Err(GenerationError::Unavailable);
        }

        debug!(
            "Sending {} prompt chars to {} ({})",
            prompt.char_count(),
            self.chat_completions_url(),
            self.model
        );

        match tokio::time::timeout(timeout, self.send(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Generation timed out after {:?}", timeout);
                Err(GenerationError::Unavailable)
            }
        }
    }
}

/// Map a non-success HTTP status (and its body) to a failure category.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            if body.to_lowercase().contains("quota") {
                GenerationError::QuotaExceeded
            } else {
                GenerationError::RateLimited
            }
        }
        StatusCode::PAYMENT_REQUIRED => GenerationError::QuotaExceeded,
        s if s.is_server_error() => GenerationError::Unavailable,
        _ => GenerationError::Unknown,
    }
}

fn classify_transport_error(error: &reqwest::Error) -> GenerationError {
    if error.is_timeout() || error.is_connect() {
        warn!("Generation endpoint unreachable: {}", error);
        GenerationError::Unavailable
    } else {
        warn!("Generation request failed: {}", error);
        GenerationError::Unknown
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(500) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
