use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::{CompletionBackend, GatewayConfig, GatewayError, Message, SamplingParams};

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI chat completions gateway
pub struct OpenAiGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl OpenAiGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn build_request_body<'a>(
        &'a self,
        messages: &'a [Message],
        params: SamplingParams,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: self.config.model(),
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiGateway {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        self.config.model()
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: SamplingParams,
    ) -> Result<String, GatewayError> {
        let body = self.build_request_body(messages, params);

        debug!(
            backend = self.name(),
            model = body.model,
            messages = messages.len(),
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            "Sending completion request"
        );
        let start = Instant::now();

        let response = self
            .client
            .post(self.config.base_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unexpected(e.to_string()))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| GatewayError::Unexpected(e.to_string()))?;

        debug!(
            status,
            duration_secs = start.elapsed().as_secs_f64(),
            "Completion response received"
        );

        if !(200..300).contains(&status) {
            warn!(status, "Completion request failed");
            return Err(classify_http_error(status, &body_text));
        }

        extract_content(&body_text)
    }
}

/// Map a non-success HTTP status onto the gateway error taxonomy
pub(crate) fn classify_http_error(status: u16, body: &str) -> GatewayError {
    let detail = error_detail(body);
    match status {
        401 | 403 => GatewayError::Authentication(format!("HTTP {}: {}", status, detail)),
        429 => GatewayError::RateLimit(format!("HTTP {}: {}", status, detail)),
        400 | 404 | 409 | 422 | 500..=599 => {
            GatewayError::Backend(format!("HTTP {}: {}", status, detail))
        }
        _ => GatewayError::Unexpected(format!("HTTP {}: {}", status, detail)),
    }
}

/// Prefer the backend's own error message, fall back to the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Pull the first choice's text out of a successful response body
pub(crate) fn extract_content(body: &str) -> Result<String, GatewayError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        GatewayError::Unexpected(format!("Failed to decode completion response: {}", e))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::Backend("Completion response contained no text".into()))
}
