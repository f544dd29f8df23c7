use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use storyloops_core::{PipelineError, PipelineSettings, RefinementRunner, ResultOrigin};
use storyloops_gateway::{CompletionBackend, GatewayError, Message, SamplingParams};
use storyloops_logging::{Logger, StoryKind};
use storyloops_teller::{AgeRange, StoryRequest};

/// Backend that plays back a fixed script of replies and records every call
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<(Vec<Message>, SamplingParams)>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(Vec<Message>, SamplingParams)> {
        self.calls.lock().unwrap().clone()
    }

    fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: SamplingParams,
    ) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push((messages.to_vec(), params));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Unexpected("script exhausted".into())))
    }
}

fn story(text: &str) -> Result<String, GatewayError> {
    Ok(text.to_string())
}

fn verdict(overall: u8, improvements: &str) -> Result<String, GatewayError> {
    Ok(format!(
        r#"```json
{{"overall_score":{overall},"age_appropriateness":8,"clarity":8,"engagement":7,"emotional_tone":9,"story_structure":7,"strengths":"Gentle and warm.","improvements":"{improvements}"}}
```"#
    ))
}

fn request() -> StoryRequest {
    StoryRequest::new("a turtle who wants to fly", AgeRange::default()).unwrap()
}

fn runner(backend: &ScriptedBackend, settings: PipelineSettings) -> RefinementRunner<'_> {
    RefinementRunner::new(backend, settings, Arc::new(Logger::silent()))
}

#[tokio::test]
async fn test_accepts_first_story() {
    let backend = ScriptedBackend::new(vec![story("Tilly the turtle."), verdict(8, "None.")]);

    let result = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap();

    assert_eq!(result.refinement_rounds(), 0);
    assert_eq!(result.trajectory().len(), 1);
    assert_eq!(result.story(), "Tilly the turtle.");
    assert!(result.met_threshold());
    assert_eq!(result.origin(), ResultOrigin::Automated);
    assert_eq!(result.trajectory()[0].kind(), StoryKind::Initial);
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_refines_once_then_accepts() {
    let backend = ScriptedBackend::new(vec![
        story("Draft one."),
        verdict(5, "Add a calmer ending."),
        story("Draft two."),
        verdict(8, "None."),
    ]);

    let result = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap();

    assert_eq!(result.refinement_rounds(), 1);
    assert_eq!(result.trajectory().len(), 2);
    assert_eq!(result.score().overall_score(), 8);
    assert_eq!(result.story(), "Draft two.");
    assert_eq!(result.trajectory()[0].score().overall_score(), 5);

    let refined = &result.trajectory()[1];
    assert_eq!(refined.kind(), StoryKind::Refinement);
    assert_eq!(refined.feedback(), Some("Add a calmer ending."));
}

#[tokio::test]
async fn test_budget_exhausted_returns_last_story() {
    let backend = ScriptedBackend::new(vec![
        story("Round zero."),
        verdict(4, "More detail."),
        story("Round one."),
        verdict(5, "Softer tone."),
        story("Round two."),
        verdict(6, "Shorter."),
    ]);

    let result = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap();

    assert_eq!(result.refinement_rounds(), 2);
    assert_eq!(result.trajectory().len(), 3);
    assert_eq!(result.story(), "Round two.");
    assert_eq!(result.score().overall_score(), 6);
    assert!(!result.met_threshold());
    assert_eq!(result.exit_code(), 1);
    assert_eq!(backend.remaining(), 0);
}

#[tokio::test]
async fn test_regression_keeps_latest_but_best_round_is_available() {
    let backend = ScriptedBackend::new(vec![
        story("Good draft."),
        verdict(6, "Tiny tweak."),
        story("Worse draft."),
        verdict(3, "Start over."),
    ]);

    let result = runner(&backend, PipelineSettings::default().with_max_rounds(1))
        .run(&request())
        .await
        .unwrap();

    assert_eq!(result.story(), "Worse draft.");
    assert_eq!(result.best_round().story(), "Good draft.");
    assert!(result.improvement_summary().contains("-3"));
}

#[tokio::test]
async fn test_round_count_never_exceeds_budget() {
    for max_rounds in 0..4 {
        let mut script = Vec::new();
        for i in 0..=max_rounds {
            script.push(story(&format!("Story {}", i)));
            script.push(verdict(2, "Keep trying."));
        }
        let backend = ScriptedBackend::new(script);

        let result = runner(&backend, PipelineSettings::default().with_max_rounds(max_rounds))
            .run(&request())
            .await
            .unwrap();

        assert_eq!(result.refinement_rounds(), max_rounds);
        assert_eq!(result.trajectory().len(), max_rounds + 1);
        assert_eq!(backend.calls().len(), 2 * (max_rounds + 1));
    }
}

#[tokio::test]
async fn test_refinement_prompt_carries_story_and_improvements() {
    let backend = ScriptedBackend::new(vec![
        story("The first telling."),
        verdict(5, "Give the owl a name."),
        story("The second telling."),
        verdict(9, "None."),
    ]);

    runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap();

    let calls = backend.calls();
    let (messages, _) = &calls[2];
    let user = &messages.last().unwrap().content;
    assert!(user.contains("The first telling."));
    assert!(user.contains("Give the owl a name."));
}

#[tokio::test]
async fn test_sampling_params_per_role() {
    let backend = ScriptedBackend::new(vec![story("Story."), verdict(8, "None.")]);

    runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls[0].1, SamplingParams::new(900, 0.7));
    assert_eq!(calls[1].1, SamplingParams::new(500, 0.2));
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let backend = ScriptedBackend::new(vec![Err(GatewayError::RateLimit(
        "slow down".into(),
    ))]);

    let err = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Generation(_)));
    assert_eq!(
        err.gateway_error(),
        Some(&GatewayError::RateLimit("slow down".into()))
    );
}

#[tokio::test]
async fn test_judge_backend_failure_propagates() {
    let backend = ScriptedBackend::new(vec![
        story("Story."),
        Err(GatewayError::Authentication("bad key".into())),
    ]);

    let err = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Evaluation(_)));
    assert!(matches!(
        err.gateway_error(),
        Some(GatewayError::Authentication(_))
    ));
}

#[tokio::test]
async fn test_unparseable_verdict_aborts_without_partial_result() {
    let backend = ScriptedBackend::new(vec![
        story("Story."),
        Ok("I loved it, nine out of ten!".to_string()),
    ]);

    let err = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap_err();

    let parse = err.parse_error().expect("parse error");
    assert_eq!(parse.raw_response(), "I loved it, nine out of ten!");
}

#[tokio::test]
async fn test_mid_loop_failure_discards_trajectory() {
    let backend = ScriptedBackend::new(vec![
        story("Draft."),
        verdict(4, "More."),
        Err(GatewayError::Backend("overloaded".into())),
    ]);

    let err = runner(&backend, PipelineSettings::default())
        .run(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Generation(GatewayError::Backend(_))));
}

#[tokio::test]
async fn test_invalid_settings_rejected_before_any_call() {
    let backend = ScriptedBackend::new(vec![story("Story."), verdict(8, "None.")]);

    let err = runner(&backend, PipelineSettings::default().with_threshold(0))
        .run(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidSettings(_)));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_threshold_one_accepts_anything() {
    let backend = ScriptedBackend::new(vec![story("Story."), verdict(1, "Everything.")]);

    let result = runner(&backend, PipelineSettings::default().with_threshold(1))
        .run(&request())
        .await
        .unwrap();

    assert!(result.met_threshold());
    assert_eq!(result.refinement_rounds(), 0);
}

#[tokio::test]
async fn test_listener_feedback_rewrites_once() {
    let backend = ScriptedBackend::new(vec![story("Now with a dragon."), verdict(6, "More.")]);

    let result = runner(&backend, PipelineSettings::default())
        .refine_with_feedback(&request(), Some("Old story."), Some("  add a friendly dragon "))
        .await
        .unwrap();

    assert_eq!(result.origin(), ResultOrigin::UserFeedback);
    assert_eq!(result.refinement_rounds(), 0);
    assert_eq!(result.trajectory().len(), 1);
    assert_eq!(result.story(), "Now with a dragon.");
    assert_eq!(result.trajectory()[0].kind(), StoryKind::UserFeedback);
    assert_eq!(result.trajectory()[0].feedback(), Some("add a friendly dragon"));
    assert_eq!(backend.calls().len(), 2);

    let calls = backend.calls();
    let user = &calls[0].0.last().unwrap().content;
    assert!(user.contains("Old story."));
    assert!(user.contains("add a friendly dragon"));
}

#[tokio::test]
async fn test_blank_feedback_runs_full_pipeline() {
    let backend = ScriptedBackend::new(vec![story("Fresh story."), verdict(9, "None.")]);

    let result = runner(&backend, PipelineSettings::default())
        .refine_with_feedback(&request(), Some("Old story."), Some("   "))
        .await
        .unwrap();

    assert_eq!(result.origin(), ResultOrigin::Automated);
    assert_eq!(result.story(), "Fresh story.");
}

#[tokio::test]
async fn test_missing_previous_story_runs_full_pipeline() {
    let backend = ScriptedBackend::new(vec![story("Fresh story."), verdict(9, "None.")]);

    let result = runner(&backend, PipelineSettings::default())
        .refine_with_feedback(&request(), None, Some("add a dragon"))
        .await
        .unwrap();

    assert_eq!(result.origin(), ResultOrigin::Automated);
}
