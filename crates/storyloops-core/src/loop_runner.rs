use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use storyloops_gateway::CompletionBackend;
use storyloops_judge::{EvaluationInput, ScoreRecord, StoryEvaluator};
use storyloops_logging::{LogEvent, Logger, StoryKind};
use storyloops_teller::{StoryGenerator, StoryRequest};

use crate::context::GenerationRound;
use crate::error::PipelineError;
use crate::outcome::{PipelineResult, ResultOrigin};
use crate::{PipelineSettings, RefinementContext};

/// Where the refinement state machine is
#[derive(Debug)]
enum Step {
    GenerateInitial,
    Evaluate {
        story: String,
        kind: StoryKind,
        feedback: Option<String>,
    },
    Refine {
        story: String,
        feedback: String,
    },
    Done,
}

/// Orchestrates the generate/judge/refine loop
pub struct RefinementRunner<'a> {
    backend: &'a dyn CompletionBackend,
    settings: PipelineSettings,
    logger: Arc<Logger>,
}

impl<'a> RefinementRunner<'a> {
    pub fn new(
        backend: &'a dyn CompletionBackend,
        settings: PipelineSettings,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            backend,
            settings,
            logger,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn generator(&self) -> StoryGenerator<'a> {
        StoryGenerator::new(self.backend).with_params(self.settings.story_params)
    }

    fn evaluator(&self) -> StoryEvaluator<'a> {
        StoryEvaluator::new(self.backend).with_params(self.settings.judge_params)
    }

    /// Run the full pipeline until the story is acceptable or the budget is spent
    pub async fn run(&self, request: &StoryRequest) -> Result<PipelineResult, PipelineError> {
        self.settings.validate()?;

        self.logger.log(&LogEvent::PipelineStarted {
            request: request.description().to_string(),
            age_range: request.age_range().to_string(),
            threshold: self.settings.threshold,
            max_rounds: self.settings.max_rounds,
        });

        let mut context = RefinementContext::new(request.clone(), self.settings.max_rounds);
        let mut step = Step::GenerateInitial;

        loop {
            debug!(round = context.rounds_completed, ?step, "Pipeline step");
            step = match step {
                Step::GenerateInitial => {
                    let story = self
                        .write_story(&context, StoryKind::Initial, None)
                        .await?;
                    Step::Evaluate {
                        story,
                        kind: StoryKind::Initial,
                        feedback: None,
                    }
                }
                Step::Evaluate {
                    story,
                    kind,
                    feedback,
                } => {
                    let score = self.judge(&context, &story).await?;
                    context.push_round(GenerationRound::new(story, score, kind, feedback));
                    self.next_step(&context)
                }
                Step::Refine { story, feedback } => {
                    context.increment_round();
                    self.logger.log(&LogEvent::RefinementStarted {
                        round: context.rounds_completed,
                        feedback: feedback.clone(),
                    });
                    let refined = self
                        .write_story(
                            &context,
                            StoryKind::Refinement,
                            Some((story.as_str(), feedback.as_str())),
                        )
                        .await?;
                    Step::Evaluate {
                        story: refined,
                        kind: StoryKind::Refinement,
                        feedback: Some(feedback),
                    }
                }
                Step::Done => {
                    let duration = context.total_duration();
                    let rounds = context.rounds_completed;
                    let trajectory = context.into_trajectory();
                    debug_assert_eq!(trajectory.len(), rounds + 1);
                    return PipelineResult::from_trajectory(
                        trajectory,
                        ResultOrigin::Automated,
                        duration,
                    )
                    .ok_or_else(|| {
                        PipelineError::InvalidSettings("pipeline finished without a story".into())
                    });
                }
            };
        }
    }

    /// Rewrite a story from listener feedback, then judge it once.
    ///
    /// Without both a previous story and non-blank feedback this runs the full
    /// automated pipeline instead.
    pub async fn refine_with_feedback(
        &self,
        request: &StoryRequest,
        previous_story: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<PipelineResult, PipelineError> {
        let (previous_story, feedback) = match (previous_story, feedback.map(str::trim)) {
            (Some(story), Some(feedback)) if !feedback.is_empty() => (story, feedback),
            _ => {
                debug!("No listener feedback supplied, running full pipeline");
                return self.run(request).await;
            }
        };

        self.settings.validate()?;
        let started_at = Instant::now();
        let context = RefinementContext::new(request.clone(), 0);

        let story = self
            .write_story(
                &context,
                StoryKind::UserFeedback,
                Some((previous_story, feedback)),
            )
            .await?;
        let score = self.judge(&context, &story).await?;

        let round = GenerationRound::new(
            story,
            score,
            StoryKind::UserFeedback,
            Some(feedback.to_string()),
        );
        PipelineResult::from_trajectory(vec![round], ResultOrigin::UserFeedback, started_at.elapsed())
            .ok_or_else(|| PipelineError::InvalidSettings("feedback round produced no story".into()))
    }

    /// Decide what follows an evaluation
    fn next_step(&self, context: &RefinementContext) -> Step {
        let Some(latest) = context.latest() else {
            return Step::GenerateInitial;
        };
        let score = latest.score();

        if score.is_acceptable() {
            self.logger.log(&LogEvent::ThresholdMet {
                rounds: context.rounds_completed,
                overall_score: score.overall_score(),
                duration_secs: context.total_duration().as_secs_f64(),
            });
            return Step::Done;
        }

        if context.has_budget() {
            info!(
                round = context.rounds_completed + 1,
                overall = score.overall_score(),
                "Below threshold, refining"
            );
            return Step::Refine {
                story: latest.story().to_string(),
                feedback: score.improvements().to_string(),
            };
        }

        self.logger.log(&LogEvent::MaxRoundsReached {
            rounds: context.rounds_completed,
            overall_score: score.overall_score(),
        });
        Step::Done
    }

    async fn write_story(
        &self,
        context: &RefinementContext,
        kind: StoryKind,
        rewrite: Option<(&str, &str)>,
    ) -> Result<String, PipelineError> {
        let round = context.rounds_completed;
        self.logger.log(&LogEvent::StoryStarted { round, kind });
        let started_at = Instant::now();

        let generator = self.generator();
        let result = match rewrite {
            None => generator.generate_initial(&context.request).await,
            Some((previous, feedback)) => {
                generator
                    .generate_refined(&context.request, previous, feedback)
                    .await
            }
        };

        match result {
            Ok(story) => {
                self.logger.log(&LogEvent::StoryCompleted {
                    round,
                    chars: story.chars().count(),
                    duration_secs: started_at.elapsed().as_secs_f64(),
                });
                Ok(story)
            }
            Err(e) => Err(self.fail(round, e.into())),
        }
    }

    async fn judge(
        &self,
        context: &RefinementContext,
        story: &str,
    ) -> Result<ScoreRecord, PipelineError> {
        let round = context.rounds_completed;
        self.logger.log(&LogEvent::JudgeStarted { round });

        let input = EvaluationInput {
            request: context.request.description(),
            story,
            age_range: context.request.age_range(),
            threshold: self.settings.threshold,
        };

        match self.evaluator().evaluate(input).await {
            Ok(score) => {
                self.logger.log(&LogEvent::JudgeCompleted {
                    round,
                    overall_score: score.overall_score(),
                    acceptable: score.is_acceptable(),
                    decision: score.short_description(),
                });
                Ok(score)
            }
            Err(e) => Err(self.fail(round, e.into())),
        }
    }

    fn fail(&self, round: usize, error: PipelineError) -> PipelineError {
        warn!(round, error = %error, "Pipeline aborted");
        self.logger.log(&LogEvent::ErrorEncountered {
            round,
            error: error.to_string(),
        });
        error
    }
}
