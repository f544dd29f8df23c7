use storyloops_gateway::GatewayError;
use storyloops_judge::{EvaluationError, ScoreParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Story generation error: {0}")]
    Generation(#[from] GatewayError),

    #[error("Story evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Invalid pipeline settings: {0}")]
    InvalidSettings(String),
}

impl PipelineError {
    /// The backend failure behind this error, from either the storyteller or the judge
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Generation(e) | Self::Evaluation(EvaluationError::Gateway(e)) => Some(e),
            _ => None,
        }
    }

    /// The judge reply that failed to parse or validate
    pub fn parse_error(&self) -> Option<&ScoreParseError> {
        match self {
            Self::Evaluation(EvaluationError::Parse(e)) => Some(e),
            _ => None,
        }
    }
}
