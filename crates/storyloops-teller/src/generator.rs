use storyloops_gateway::{CompletionBackend, GatewayError, SamplingParams};
use tracing::{debug, info};

use crate::{StoryPrompts, StoryRequest};

/// Sampling temperature for storytelling; leans creative
pub const STORY_TEMPERATURE: f32 = 0.7;

/// Token ceiling for a story, roughly a five minute read-aloud
pub const MAX_STORY_TOKENS: u32 = 900;

/// Default sampling parameters for story generation
pub fn default_story_params() -> SamplingParams {
    SamplingParams::new(MAX_STORY_TOKENS, STORY_TEMPERATURE)
}

/// Writes and rewrites stories through a completion backend.
///
/// Holds no state between calls.
pub struct StoryGenerator<'a> {
    backend: &'a dyn CompletionBackend,
    params: SamplingParams,
}

impl<'a> StoryGenerator<'a> {
    pub fn new(backend: &'a dyn CompletionBackend) -> Self {
        Self {
            backend,
            params: default_story_params(),
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Write the first draft for a request
    pub async fn generate_initial(&self, request: &StoryRequest) -> Result<String, GatewayError> {
        let messages = StoryPrompts::initial_messages(request);

        debug!(
            backend = self.backend.name(),
            age_range = %request.age_range(),
            prompt_len = messages[1].content.len(),
            "Generating initial story"
        );

        let story = self.backend.complete(&messages, self.params).await?;
        let story = story.trim().to_string();

        info!(chars = story.len(), "Initial story generated");
        Ok(story)
    }

    /// Rewrite `previous_story`, addressing `feedback`
    pub async fn generate_refined(
        &self,
        request: &StoryRequest,
        previous_story: &str,
        feedback: &str,
    ) -> Result<String, GatewayError> {
        let messages = StoryPrompts::refinement_messages(request, previous_story, feedback);

        debug!(
            backend = self.backend.name(),
            previous_len = previous_story.len(),
            feedback_len = feedback.len(),
            "Generating refined story"
        );

        let story = self.backend.complete(&messages, self.params).await?;
        let story = story.trim().to_string();

        info!(chars = story.len(), "Refined story generated");
        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storyloops_gateway::{Message, Role};

    use crate::AgeRange;

    struct EchoBackend {
        reply: Result<String, GatewayError>,
        seen: Mutex<Vec<(Vec<Message>, SamplingParams)>>,
    }

    impl EchoBackend {
        fn replying(reply: Result<String, GatewayError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn complete(
            &self,
            messages: &[Message],
            params: SamplingParams,
        ) -> Result<String, GatewayError> {
            self.seen.lock().unwrap().push((messages.to_vec(), params));
            self.reply.clone()
        }
    }

    fn request() -> StoryRequest {
        StoryRequest::new("a dragon who loves tea", AgeRange::default()).unwrap()
    }

    #[tokio::test]
    async fn test_initial_story_is_trimmed() {
        let backend = EchoBackend::replying(Ok("\n  Once upon a time...  \n".into()));
        let generator = StoryGenerator::new(&backend);

        let story = generator.generate_initial(&request()).await.unwrap();

        assert_eq!(story, "Once upon a time...");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, SamplingParams::new(900, 0.7));
        assert_eq!(seen[0].0[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_refined_story_uses_same_params() {
        let backend = EchoBackend::replying(Ok("A better story".into()));
        let generator = StoryGenerator::new(&backend);

        generator
            .generate_refined(&request(), "Old story", "More cozy details")
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].1, default_story_params());
        assert!(seen[0].0[1].content.contains("More cozy details"));
    }

    #[tokio::test]
    async fn test_gateway_errors_propagate_unchanged() {
        let backend = EchoBackend::replying(Err(GatewayError::RateLimit("slow".into())));
        let generator = StoryGenerator::new(&backend);

        let err = generator.generate_initial(&request()).await.unwrap_err();
        assert_eq!(err, GatewayError::RateLimit("slow".into()));
    }
}
