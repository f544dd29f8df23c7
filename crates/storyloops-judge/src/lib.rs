//! # storyloops-judge
//!
//! Model-driven quality evaluation for bedtime stories.
//!
//! ## Key Types
//!
//! - [`StoryEvaluator`] - Builds the review prompt and scores a story
//! - [`ScoreSheet`] - Validated judge reply, parsed from free-form text
//! - [`ScoreRecord`] - A score sheet plus its acceptance verdict

pub mod evaluator;
mod prompts;
mod score;

pub use evaluator::{
    default_judge_params, EvaluationError, EvaluationInput, StoryEvaluator, DEFAULT_THRESHOLD,
    JUDGE_TEMPERATURE, MAX_JUDGE_TOKENS,
};
pub use prompts::JudgePrompts;
pub use score::{
    DimensionScores, ScoreParseError, ScoreRecord, ScoreSheet, MAX_SCORE, MIN_SCORE, SCORE_FIELDS,
    TEXT_FIELDS,
};
