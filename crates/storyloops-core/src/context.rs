use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use storyloops_judge::ScoreRecord;
use storyloops_logging::StoryKind;
use storyloops_teller::StoryRequest;

/// One story version and the judge's verdict on it. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRound {
    story: String,
    score: ScoreRecord,
    kind: StoryKind,
    /// Feedback the story was rewritten from, if any
    feedback: Option<String>,
    timestamp: DateTime<Utc>,
}

impl GenerationRound {
    pub fn new(story: String, score: ScoreRecord, kind: StoryKind, feedback: Option<String>) -> Self {
        Self {
            story,
            score,
            kind,
            feedback,
            timestamp: Utc::now(),
        }
    }

    pub fn story(&self) -> &str {
        &self.story
    }

    pub fn score(&self) -> &ScoreRecord {
        &self.score
    }

    pub fn kind(&self) -> StoryKind {
        self.kind
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Per-invocation state for one story lineage
#[derive(Debug)]
pub struct RefinementContext {
    pub request: StoryRequest,
    /// Refinement rounds completed so far
    pub rounds_completed: usize,
    /// Append-only log of every story produced
    trajectory: Vec<GenerationRound>,
    started_at: Instant,
    pub max_rounds: usize,
}

impl RefinementContext {
    pub fn new(request: StoryRequest, max_rounds: usize) -> Self {
        Self {
            request,
            rounds_completed: 0,
            trajectory: Vec::new(),
            started_at: Instant::now(),
            max_rounds,
        }
    }

    pub fn increment_round(&mut self) {
        self.rounds_completed += 1;
    }

    pub fn push_round(&mut self, round: GenerationRound) {
        self.trajectory.push(round);
    }

    pub fn trajectory(&self) -> &[GenerationRound] {
        &self.trajectory
    }

    pub fn latest(&self) -> Option<&GenerationRound> {
        self.trajectory.last()
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the refinement budget allows another round
    pub fn has_budget(&self) -> bool {
        self.rounds_completed < self.max_rounds
    }

    pub fn into_trajectory(self) -> Vec<GenerationRound> {
        self.trajectory
    }
}
