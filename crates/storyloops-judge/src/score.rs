use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Lowest score the judge may award
pub const MIN_SCORE: u8 = 1;

/// Highest score the judge may award
pub const MAX_SCORE: u8 = 10;

/// Integer fields the judge must return, in rubric order
pub const SCORE_FIELDS: [&str; 6] = [
    "overall_score",
    "age_appropriateness",
    "clarity",
    "engagement",
    "emotional_tone",
    "story_structure",
];

/// Free-text fields the judge must return
pub const TEXT_FIELDS: [&str; 2] = ["strengths", "improvements"];

#[derive(Error, Debug)]
pub enum ScoreParseError {
    #[error("Could not parse judge response as JSON. Parse error: {source}. Raw response:\n{raw}")]
    Decode {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("Judge response is not a JSON object")]
    NotAnObject { raw: String },

    #[error("Judge response missing required field: {field}")]
    MissingField { field: &'static str, raw: String },

    #[error("Invalid score for {field}: {value}. Must be integer 1-10.")]
    InvalidScore {
        field: &'static str,
        value: String,
        raw: String,
    },

    #[error("Invalid value for {field}: expected text")]
    InvalidText { field: &'static str, raw: String },
}

impl ScoreParseError {
    /// The unmodified judge reply, kept for logging or re-prompting
    pub fn raw_response(&self) -> &str {
        match self {
            Self::Decode { raw, .. }
            | Self::NotAnObject { raw }
            | Self::MissingField { raw, .. }
            | Self::InvalidScore { raw, .. }
            | Self::InvalidText { raw, .. } => raw,
        }
    }

    /// The offending field, for validation failures
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. }
            | Self::InvalidScore { field, .. }
            | Self::InvalidText { field, .. } => Some(*field),
            Self::Decode { .. } | Self::NotAnObject { .. } => None,
        }
    }
}

/// The six rubric scores, each guaranteed to be in [`MIN_SCORE`, `MAX_SCORE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionScores {
    pub overall_score: u8,
    pub age_appropriateness: u8,
    pub clarity: u8,
    pub engagement: u8,
    pub emotional_tone: u8,
    pub story_structure: u8,
}

/// A fully validated judge reply. There is no way to build a partial one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSheet {
    scores: DimensionScores,
    strengths: String,
    improvements: String,
}

impl ScoreSheet {
    /// Extract and validate a score sheet from free-form judge output.
    ///
    /// Extraction is liberal: surrounding whitespace, a ``` or ```json fence, and
    /// prose around a single JSON object are tolerated. Validation is strict:
    /// all eight fields must be present and every score an integer in 1-10.
    pub fn parse_and_validate(raw: &str) -> Result<Self, ScoreParseError> {
        debug!(output_len = raw.len(), "Parsing judge response");

        let value = decode(raw)?;
        let object = value.as_object().ok_or_else(|| ScoreParseError::NotAnObject {
            raw: raw.to_string(),
        })?;

        Self::validate(object, raw)
    }

    /// Build a sheet from already-typed values, enforcing the same score bounds
    pub fn new(
        scores: DimensionScores,
        strengths: impl Into<String>,
        improvements: impl Into<String>,
    ) -> Result<Self, ScoreParseError> {
        let values = [
            scores.overall_score,
            scores.age_appropriateness,
            scores.clarity,
            scores.engagement,
            scores.emotional_tone,
            scores.story_structure,
        ];
        for (field, value) in SCORE_FIELDS.into_iter().zip(values) {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(ScoreParseError::InvalidScore {
                    field,
                    value: value.to_string(),
                    raw: String::new(),
                });
            }
        }

        Ok(Self {
            scores,
            strengths: strengths.into(),
            improvements: improvements.into(),
        })
    }

    fn validate(object: &Map<String, Value>, raw: &str) -> Result<Self, ScoreParseError> {
        for field in SCORE_FIELDS.into_iter().chain(TEXT_FIELDS) {
            if !object.contains_key(field) {
                return Err(ScoreParseError::MissingField {
                    field,
                    raw: raw.to_string(),
                });
            }
        }

        let score = |field: &'static str| -> Result<u8, ScoreParseError> {
            let value = &object[field];
            value
                .as_u64()
                .filter(|n| (MIN_SCORE as u64..=MAX_SCORE as u64).contains(n))
                .map(|n| n as u8)
                .ok_or_else(|| ScoreParseError::InvalidScore {
                    field,
                    value: value.to_string(),
                    raw: raw.to_string(),
                })
        };

        let scores = DimensionScores {
            overall_score: score("overall_score")?,
            age_appropriateness: score("age_appropriateness")?,
            clarity: score("clarity")?,
            engagement: score("engagement")?,
            emotional_tone: score("emotional_tone")?,
            story_structure: score("story_structure")?,
        };

        let text = |field: &'static str| -> Result<String, ScoreParseError> {
            object[field]
                .as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| ScoreParseError::InvalidText {
                    field,
                    raw: raw.to_string(),
                })
        };

        Ok(Self {
            scores,
            strengths: text("strengths")?,
            improvements: text("improvements")?,
        })
    }

    /// Attach the acceptance verdict for a given threshold
    pub fn judge(self, threshold: u8) -> ScoreRecord {
        ScoreRecord {
            is_acceptable: self.scores.overall_score >= threshold,
            sheet: self,
        }
    }

    pub fn scores(&self) -> &DimensionScores {
        &self.scores
    }

    pub fn overall_score(&self) -> u8 {
        self.scores.overall_score
    }

    pub fn strengths(&self) -> &str {
        &self.strengths
    }

    pub fn improvements(&self) -> &str {
        &self.improvements
    }
}

/// Strip whitespace and an optional markdown fence from a judge reply
fn strip_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

fn decode(raw: &str) -> Result<Value, ScoreParseError> {
    let cleaned = strip_fence(raw);

    let first_error = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Fall back to the outermost braced segment
    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            let candidate = &cleaned[start..=end];
            debug!(
                start,
                end,
                "Direct decode failed, retrying on braced segment"
            );
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Ok(value);
            }
        }
    }

    Err(ScoreParseError::Decode {
        source: first_error,
        raw: raw.to_string(),
    })
}

/// A score sheet plus the acceptance verdict it was judged with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    #[serde(flatten)]
    sheet: ScoreSheet,
    is_acceptable: bool,
}

impl ScoreRecord {
    pub fn sheet(&self) -> &ScoreSheet {
        &self.sheet
    }

    pub fn scores(&self) -> &DimensionScores {
        self.sheet.scores()
    }

    pub fn overall_score(&self) -> u8 {
        self.sheet.overall_score()
    }

    pub fn strengths(&self) -> &str {
        self.sheet.strengths()
    }

    pub fn improvements(&self) -> &str {
        self.sheet.improvements()
    }

    pub fn is_acceptable(&self) -> bool {
        self.is_acceptable
    }

    /// Get a short description of the verdict for logging
    pub fn short_description(&self) -> String {
        if self.is_acceptable {
            format!("ACCEPT ({}/{})", self.overall_score(), MAX_SCORE)
        } else {
            format!("REFINE ({}/{})", self.overall_score(), MAX_SCORE)
        }
    }
}

impl std::fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.scores();
        writeln!(f, "Story Evaluation Summary")?;
        writeln!(f, "------------------------")?;
        writeln!(f, "Overall Score: {}/10", s.overall_score)?;
        writeln!(f, "Age Appropriateness: {}/10", s.age_appropriateness)?;
        writeln!(f, "Clarity: {}/10", s.clarity)?;
        writeln!(f, "Engagement: {}/10", s.engagement)?;
        writeln!(f, "Emotional Tone: {}/10", s.emotional_tone)?;
        writeln!(f, "Story Structure: {}/10", s.story_structure)?;
        writeln!(f)?;
        writeln!(f, "Strengths: {}", self.strengths())?;
        writeln!(f)?;
        write!(f, "Areas for Improvement: {}", self.improvements())
    }
}
