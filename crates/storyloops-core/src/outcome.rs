use serde::Serialize;
use std::time::Duration;
use storyloops_judge::ScoreRecord;

use crate::GenerationRound;

/// What produced a pipeline result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    /// Full generate/judge/refine run
    Automated,
    /// Single rewrite from listener feedback
    UserFeedback,
}

/// The final outcome of one pipeline invocation.
///
/// The final story and score are always the last trajectory entry, and
/// `refinement_rounds` is always one less than the trajectory length.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    story: String,
    score: ScoreRecord,
    refinement_rounds: usize,
    trajectory: Vec<GenerationRound>,
    origin: ResultOrigin,
    total_duration_secs: f64,
}

impl PipelineResult {
    /// Build a result from a trajectory. Returns `None` for an empty trajectory.
    pub fn from_trajectory(
        trajectory: Vec<GenerationRound>,
        origin: ResultOrigin,
        duration: Duration,
    ) -> Option<Self> {
        let last = trajectory.last()?;
        Some(Self {
            story: last.story().to_string(),
            score: last.score().clone(),
            refinement_rounds: trajectory.len() - 1,
            origin,
            total_duration_secs: duration.as_secs_f64(),
            trajectory,
        })
    }

    pub fn story(&self) -> &str {
        &self.story
    }

    pub fn score(&self) -> &ScoreRecord {
        &self.score
    }

    pub fn refinement_rounds(&self) -> usize {
        self.refinement_rounds
    }

    pub fn trajectory(&self) -> &[GenerationRound] {
        &self.trajectory
    }

    pub fn origin(&self) -> ResultOrigin {
        self.origin
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    pub fn was_refined(&self) -> bool {
        self.refinement_rounds > 0
    }

    pub fn met_threshold(&self) -> bool {
        self.score.is_acceptable()
    }

    /// Highest-scoring round; the earliest wins a tie
    pub fn best_round(&self) -> &GenerationRound {
        let mut best = &self.trajectory[0];
        for round in &self.trajectory[1..] {
            if round.score().overall_score() > best.score().overall_score() {
                best = round;
            }
        }
        best
    }

    /// Human-readable account of how the score moved across refinement
    pub fn improvement_summary(&self) -> String {
        if self.origin == ResultOrigin::UserFeedback {
            return format!(
                "Story was rewritten from your feedback.\nScore: {}/10",
                self.score.overall_score()
            );
        }

        if !self.was_refined() {
            return "Story met quality standards on first generation.".to_string();
        }

        let initial = i32::from(self.trajectory[0].score().overall_score());
        let final_score = i32::from(self.score.overall_score());
        let delta = final_score - initial;

        let mut lines = vec![
            format!("Story was refined {} time(s).", self.refinement_rounds),
            format!("Initial score: {}/10", initial),
            format!("Final score: {}/10", final_score),
        ];

        match delta {
            d if d > 0 => lines.push(format!("Improvement: +{} points", d)),
            d if d < 0 => lines.push(format!("Score change: {} points", d)),
            _ => lines.push("Score maintained through refinement".to_string()),
        }

        lines.join("\n")
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        if self.met_threshold() {
            0
        } else {
            1
        }
    }
}
