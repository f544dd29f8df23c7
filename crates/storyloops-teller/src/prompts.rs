use storyloops_gateway::Message;

use crate::{AgeRange, StoryRequest};

/// Prompt templates for the storyteller
pub struct StoryPrompts;

impl StoryPrompts {
    /// Storyteller persona, parameterized by the target audience
    pub fn build_system_prompt(age_range: AgeRange) -> String {
        format!(
            r#"You are a warm and experienced children's storyteller, like a kind grandparent who has told thousands of bedtime stories.

Your audience is children between {min_age} and {max_age} years old.

## Writing Guidelines
- Use simple vocabulary that young children can understand
- Keep sentences short and rhythmic, easy to read aloud
- Create vivid but gentle imagery that sparks imagination
- Include sensory details (soft blankets, warm sunshine, gentle breezes)
- Give characters relatable emotions and clear motivations

## Story Structure (follow this arc)
1. Opening: Set a cozy scene and introduce the main character
2. Gentle challenge: Present a small problem or exciting discovery
3. Working through it: Show the character handling the situation
4. Resolution: Solve the problem in a satisfying, kind way
5. Calming close: Wind down with peaceful imagery, perfect for sleep

## Content Rules
- No violence, scary antagonists, or threatening situations
- No death, serious illness, or permanent loss
- No unresolved tension; every worry is settled before the end
- No complex adult themes or moral ambiguity
- Characters are kind to each other and solve problems through friendship, creativity, or kindness

## Tone
- Gentle and reassuring throughout
- Light humor suited to young children
- End on a peaceful, sleepy note

Write in flowing prose paragraphs. Do not use bullet points or headers in the story itself."#,
            min_age = age_range.min_age(),
            max_age = age_range.max_age(),
        )
    }

    /// User turn for a first draft
    pub fn build_initial_prompt(request: &StoryRequest) -> String {
        format!(
            r#"Please write a bedtime story based on this request:

"{request}"

Remember to follow the story arc structure and end with calming imagery suitable for helping a child fall asleep."#,
            request = request.description(),
        )
    }

    /// User turn for a rewrite driven by reviewer or listener feedback
    pub fn build_refinement_prompt(
        request: &StoryRequest,
        previous_story: &str,
        feedback: &str,
    ) -> String {
        format!(
            r#"I previously wrote this bedtime story based on the request: "{request}"

Here is the story I wrote:

---
{story}
---

A reviewer provided this feedback for improvement:

{feedback}

Please rewrite the story incorporating this feedback. Keep everything that was working well, and address only the specific issues mentioned. The story should still follow the story arc structure and end peacefully.

Output only the improved story, with no explanations or commentary."#,
            request = request.description(),
            story = previous_story,
            feedback = feedback.trim(),
        )
    }

    pub fn initial_messages(request: &StoryRequest) -> Vec<Message> {
        vec![
            Message::system(Self::build_system_prompt(request.age_range())),
            Message::user(Self::build_initial_prompt(request)),
        ]
    }

    pub fn refinement_messages(
        request: &StoryRequest,
        previous_story: &str,
        feedback: &str,
    ) -> Vec<Message> {
        vec![
            Message::system(Self::build_system_prompt(request.age_range())),
            Message::user(Self::build_refinement_prompt(
                request,
                previous_story,
                feedback,
            )),
        ]
    }
}
