//! # storyloops-gateway
//!
//! The one I/O primitive the story pipeline depends on: send an ordered list of
//! role-tagged messages, get a completion back.
//!
//! Failures are normalized into [`GatewayError`]. Nothing here retries.

mod config;
mod openai;
mod traits;

pub use config::{GatewayConfig, API_KEY_ENV, API_KEY_PREFIX, API_URL_ENV, DEFAULT_API_URL, MODEL};
pub use openai::OpenAiGateway;
pub use traits::{CompletionBackend, GatewayError, Message, Role, SamplingParams};

/// Resolve credentials from the environment and build the default gateway
pub fn connect_from_env() -> Result<Box<dyn CompletionBackend>, GatewayError> {
    let config = GatewayConfig::from_env()?;
    Ok(Box::new(OpenAiGateway::new(config)))
}
