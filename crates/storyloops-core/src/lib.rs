//! # storyloops-core
//!
//! The generate, judge, refine loop. [`RefinementRunner`] drives a story
//! through at most `max_rounds` rewrites and returns a [`PipelineResult`]
//! carrying every version it produced.

mod context;
mod error;
mod loop_runner;
mod outcome;
mod settings;

pub use context::{GenerationRound, RefinementContext};
pub use error::PipelineError;
pub use loop_runner::RefinementRunner;
pub use outcome::{PipelineResult, ResultOrigin};
pub use settings::{PipelineSettings, MAX_REFINEMENT_ROUNDS};
