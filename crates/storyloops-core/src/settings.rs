use storyloops_gateway::SamplingParams;
use storyloops_judge::{default_judge_params, DEFAULT_THRESHOLD, MAX_SCORE, MIN_SCORE};
use storyloops_teller::{default_story_params, AgeRange};

use crate::PipelineError;

/// Refinement rounds allowed after the first draft
pub const MAX_REFINEMENT_ROUNDS: usize = 2;

/// Tunables for one pipeline invocation. Read-only once a run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub story_params: SamplingParams,
    pub judge_params: SamplingParams,
    /// Minimum overall score that stops refinement
    pub threshold: u8,
    /// Refinement rounds allowed after the first draft
    pub max_rounds: usize,
    /// Audience used when a caller does not pick one
    pub default_age_range: AgeRange,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            story_params: default_story_params(),
            judge_params: default_judge_params(),
            threshold: DEFAULT_THRESHOLD,
            max_rounds: MAX_REFINEMENT_ROUNDS,
            default_age_range: AgeRange::default(),
        }
    }
}

impl PipelineSettings {
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_age_range(mut self, age_range: AgeRange) -> Self {
        self.default_age_range = age_range;
        self
    }

    pub fn with_story_params(mut self, params: SamplingParams) -> Self {
        self.story_params = params;
        self
    }

    pub fn with_judge_params(mut self, params: SamplingParams) -> Self {
        self.judge_params = params;
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.threshold) {
            return Err(PipelineError::InvalidSettings(format!(
                "threshold must be between {} and {} (got {})",
                MIN_SCORE, MAX_SCORE, self.threshold
            )));
        }
        validate_params("story", &self.story_params)?;
        validate_params("judge", &self.judge_params)
    }
}

fn validate_params(role: &str, params: &SamplingParams) -> Result<(), PipelineError> {
    if params.max_tokens == 0 {
        return Err(PipelineError::InvalidSettings(format!(
            "{} token ceiling must be positive",
            role
        )));
    }
    if !(0.0..=1.0).contains(&params.temperature) {
        return Err(PipelineError::InvalidSettings(format!(
            "{} temperature must be within [0, 1] (got {})",
            role, params.temperature
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.threshold, 7);
        assert_eq!(settings.max_rounds, 2);
        assert_eq!(settings.story_params, SamplingParams::new(900, 0.7));
        assert_eq!(settings.judge_params, SamplingParams::new(500, 0.2));
        assert_eq!(settings.default_age_range, AgeRange::new(5, 10).unwrap());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        for threshold in [0, 11] {
            let settings = PipelineSettings::default().with_threshold(threshold);
            assert!(matches!(
                settings.validate(),
                Err(PipelineError::InvalidSettings(_))
            ));
        }
    }

    #[test]
    fn test_bad_sampling_params() {
        let hot = PipelineSettings::default().with_story_params(SamplingParams::new(900, 1.5));
        assert!(hot.validate().is_err());

        let empty = PipelineSettings::default().with_judge_params(SamplingParams::new(0, 0.2));
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_zero_rounds_is_valid() {
        assert!(PipelineSettings::default()
            .with_max_rounds(0)
            .validate()
            .is_ok());
    }
}
