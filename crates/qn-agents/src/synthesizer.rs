//! Synthesizer preset: merges raw articles into a short synthesis.

use crate::NewsAgent;

const INSTRUCTIONS: &str = r#"You are a news synthesis expert. You receive raw news articles on one topic.

## Your Task
1. Analyze the articles provided
2. Identify the key themes and the important facts
3. Combine information across sources rather than summarizing each one in turn
4. Stay factual and keep journalistic objectivity
5. Write in a clear, professional style

## Output
A synthesis of the main points in 2-3 paragraphs. Comprehensive but concise."#;

pub struct SynthesizerAgent;

impl SynthesizerAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SynthesizerAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsAgent for SynthesizerAgent {
    fn name(&self) -> &str {
        "synthesizer"
    }

    fn description(&self) -> &str {
        "News Synthesizer"
    }

    fn instructions(&self) -> &str {
        INSTRUCTIONS
    }

    fn input_template(&self) -> &str {
        "Synthesize these news articles:\n{input}"
    }
}
