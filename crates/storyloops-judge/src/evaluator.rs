use storyloops_gateway::{CompletionBackend, GatewayError, SamplingParams};
use storyloops_teller::AgeRange;
use tracing::{debug, info, warn};

use crate::{JudgePrompts, ScoreParseError, ScoreRecord, ScoreSheet};

/// Sampling temperature for judging; low for reproducible scores
pub const JUDGE_TEMPERATURE: f32 = 0.2;

/// Token ceiling for the judge's JSON reply
pub const MAX_JUDGE_TOKENS: u32 = 500;

/// Minimum overall score for a story to stop refining
pub const DEFAULT_THRESHOLD: u8 = 7;

/// Default sampling parameters for evaluation
pub fn default_judge_params() -> SamplingParams {
    SamplingParams::new(MAX_JUDGE_TOKENS, JUDGE_TEMPERATURE)
}

/// Inputs required to evaluate one story.
#[derive(Clone, Copy)]
pub struct EvaluationInput<'a> {
    pub request: &'a str,
    pub story: &'a str,
    pub age_range: AgeRange,
    pub threshold: u8,
}

/// Evaluator that asks the backend to score a story
pub struct StoryEvaluator<'a> {
    backend: &'a dyn CompletionBackend,
    params: SamplingParams,
}

impl<'a> StoryEvaluator<'a> {
    pub fn new(backend: &'a dyn CompletionBackend) -> Self {
        Self {
            backend,
            params: default_judge_params(),
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Score a story. Never fabricates a default score on failure.
    pub async fn evaluate(&self, input: EvaluationInput<'_>) -> Result<ScoreRecord, EvaluationError> {
        let messages = JudgePrompts::evaluation_messages(input.request, input.story, input.age_range);

        debug!(
            backend = self.backend.name(),
            story_len = input.story.len(),
            threshold = input.threshold,
            "Running judge evaluation"
        );

        let raw = self.backend.complete(&messages, self.params).await?;

        let sheet = ScoreSheet::parse_and_validate(&raw).map_err(|e| {
            warn!(error = %e, field = ?e.field(), "Judge reply rejected");
            e
        })?;
        let record = sheet.judge(input.threshold);

        info!(
            overall = record.overall_score(),
            acceptable = record.is_acceptable(),
            "Judge completed"
        );

        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Judge request failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to parse judge response: {0}")]
    Parse(#[from] ScoreParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storyloops_gateway::Message;

    struct CannedJudge {
        reply: String,
        params: Mutex<Option<SamplingParams>>,
    }

    #[async_trait]
    impl CompletionBackend for CannedJudge {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-1"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            params: SamplingParams,
        ) -> Result<String, GatewayError> {
            *self.params.lock().unwrap() = Some(params);
            Ok(self.reply.clone())
        }
    }

    fn judge_replying(reply: &str) -> CannedJudge {
        CannedJudge {
            reply: reply.to_string(),
            params: Mutex::new(None),
        }
    }

    fn input(threshold: u8) -> EvaluationInput<'static> {
        EvaluationInput {
            request: "a turtle who wants to fly",
            story: "Tilly the turtle watched the birds.",
            age_range: AgeRange::default(),
            threshold,
        }
    }

    const REPLY: &str = r#"```json
{"overall_score": 7, "age_appropriateness": 8, "clarity": 7, "engagement": 6, "emotional_tone": 8, "story_structure": 7, "strengths": "Warm.", "improvements": "More wonder."}
```"#;

    #[tokio::test]
    async fn test_score_at_threshold_is_acceptable() {
        let backend = judge_replying(REPLY);
        let record = StoryEvaluator::new(&backend).evaluate(input(7)).await.unwrap();

        assert_eq!(record.overall_score(), 7);
        assert!(record.is_acceptable());
        assert_eq!(record.improvements(), "More wonder.");
        assert_eq!(
            *backend.params.lock().unwrap(),
            Some(SamplingParams::new(500, 0.2))
        );
    }

    #[tokio::test]
    async fn test_score_below_threshold_is_not_acceptable() {
        let backend = judge_replying(REPLY);
        let record = StoryEvaluator::new(&backend).evaluate(input(8)).await.unwrap();
        assert!(!record.is_acceptable());
    }

    #[tokio::test]
    async fn test_parse_failure_propagates() {
        let backend = judge_replying("I loved it! 10/10");
        let err = StoryEvaluator::new(&backend)
            .evaluate(input(7))
            .await
            .unwrap_err();

        match err {
            EvaluationError::Parse(parse) => assert_eq!(parse.raw_response(), "I loved it! 10/10"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
