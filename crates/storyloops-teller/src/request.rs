use serde::Serialize;
use thiserror::Error;

/// Youngest listener stories are written for by default
pub const DEFAULT_MIN_AGE: u8 = 5;

/// Oldest listener stories are written for by default
pub const DEFAULT_MAX_AGE: u8 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Story request is empty")]
    EmptyDescription,

    #[error("Ages must be positive (got {min_age}-{max_age})")]
    NonPositiveAge { min_age: u8, max_age: u8 },

    #[error("Minimum age {min_age} is greater than maximum age {max_age}")]
    InvertedAgeRange { min_age: u8, max_age: u8 },
}

/// Target audience, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AgeRange {
    min_age: u8,
    max_age: u8,
}

impl AgeRange {
    pub fn new(min_age: u8, max_age: u8) -> Result<Self, RequestError> {
        if min_age == 0 || max_age == 0 {
            return Err(RequestError::NonPositiveAge { min_age, max_age });
        }
        if min_age > max_age {
            return Err(RequestError::InvertedAgeRange { min_age, max_age });
        }
        Ok(Self { min_age, max_age })
    }

    pub fn min_age(&self) -> u8 {
        self.min_age
    }

    pub fn max_age(&self) -> u8 {
        self.max_age
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self {
            min_age: DEFAULT_MIN_AGE,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl std::fmt::Display for AgeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min_age, self.max_age)
    }
}

/// What the listener asked for. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryRequest {
    description: String,
    age_range: AgeRange,
}

impl StoryRequest {
    pub fn new(description: impl Into<String>, age_range: AgeRange) -> Result<Self, RequestError> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(RequestError::EmptyDescription);
        }
        Ok(Self {
            description,
            age_range,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn age_range(&self) -> AgeRange {
        self.age_range
    }
}
