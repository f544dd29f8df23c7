use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the completion backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication with the completion backend failed: {0}")]
    Authentication(String),

    #[error("Completion backend rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Completion backend error: {0}")]
    Backend(String),

    #[error("Unexpected error during completion call: {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// The diagnostic message carried by the error
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(m)
            | Self::Authentication(m)
            | Self::RateLimit(m)
            | Self::Backend(m)
            | Self::Unexpected(m) => m,
        }
    }

    /// Whether a fresh invocation has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit(_) | Self::Backend(_))
    }
}

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Sampling parameters for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Upper bound on generated tokens (must be positive)
    pub max_tokens: u32,
    /// Sampling temperature in [0, 1]
    pub temperature: f32,
}

impl SamplingParams {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// The single request/response primitive the pipeline depends on
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Human-readable name of the backend (e.g., "OpenAI")
    fn name(&self) -> &str;

    /// The model identifier requests are sent to
    fn model(&self) -> &str;

    /// Send an ordered conversation and return the completion text.
    ///
    /// Exactly one round trip per call. No retries.
    async fn complete(
        &self,
        messages: &[Message],
        params: SamplingParams,
    ) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::system("be kind")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be kind"}"#);
    }

    #[test]
    fn test_error_message_is_preserved() {
        let err = GatewayError::RateLimit("slow down".into());
        assert_eq!(err.message(), "slow down");
        assert!(err.to_string().contains("slow down"));
        assert!(err.is_transient());
        assert!(!GatewayError::Authentication("bad key".into()).is_transient());
    }
}
