use crate::GatewayError;

/// Environment variable holding the backend credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the chat completions endpoint
pub const API_URL_ENV: &str = "STORYLOOPS_API_URL";

/// Prefix every OpenAI secret key starts with
pub const API_KEY_PREFIX: &str = "sk-";

/// Default chat completions endpoint
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The model stories are generated and judged with. Fixed by policy.
pub const MODEL: &str = "gpt-3.5-turbo";

/// Resolved connection settings for the completion backend.
///
/// Built once at startup and read-only afterwards. A value of this type always
/// holds a structurally plausible credential.
#[derive(Clone)]
pub struct GatewayConfig {
    api_key: String,
    base_url: String,
    model: String,
}

impl GatewayConfig {
    /// Validate a credential and build a config pointing at the default endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let api_key = api_key.into().trim().to_string();

        if api_key.is_empty() {
            return Err(GatewayError::Configuration(format!(
                "{} is empty. Set it with: export {}='your-key-here'",
                API_KEY_ENV, API_KEY_ENV
            )));
        }

        if !api_key.starts_with(API_KEY_PREFIX) {
            return Err(GatewayError::Configuration(format!(
                "{} does not look like an OpenAI key (expected prefix '{}')",
                API_KEY_ENV, API_KEY_PREFIX
            )));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
            model: MODEL.to_string(),
        })
    }

    /// Resolve the config from process environment
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            GatewayError::Configuration(format!(
                "{} environment variable is not set. Set it with: export {}='your-key-here' \
                 or add it to a .env file",
                API_KEY_ENV, API_KEY_ENV
            ))
        })?;

        let config = Self::new(api_key)?;
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Ok(config.with_base_url(url.trim())),
            _ => Ok(config),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key_is_accepted() {
        let config = GatewayConfig::new("  sk-test-123 \n").unwrap();
        assert_eq!(config.api_key(), "sk-test-123");
        assert_eq!(config.base_url(), DEFAULT_API_URL);
        assert_eq!(config.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_empty_key_is_a_configuration_error() {
        let err = GatewayConfig::new("   ").unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn test_key_without_prefix_is_rejected() {
        let err = GatewayConfig::new("pk-live-abc").unwrap_err();
        match err {
            GatewayError::Configuration(msg) => assert!(msg.contains("sk-")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GatewayConfig::new("sk-secret").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_base_url_override() {
        let config = GatewayConfig::new("sk-x")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/chat/completions");
        assert_eq!(config.base_url(), "http://localhost:8080/v1/chat/completions");
    }
}
