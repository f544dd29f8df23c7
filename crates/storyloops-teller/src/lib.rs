//! # storyloops-teller
//!
//! Story generation: prompt construction for first drafts and feedback-driven
//! rewrites, sent through a [`storyloops_gateway::CompletionBackend`].

mod generator;
mod prompts;
mod request;

pub use generator::{default_story_params, StoryGenerator, MAX_STORY_TOKENS, STORY_TEMPERATURE};
pub use prompts::StoryPrompts;
pub use request::{AgeRange, RequestError, StoryRequest, DEFAULT_MAX_AGE, DEFAULT_MIN_AGE};
