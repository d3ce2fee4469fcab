//! Summarizer preset: wire-service style single paragraph.

use crate::NewsAgent;

const INSTRUCTIONS: &str = r#"You are an expert news summarizer. Write with the clarity of AP and Reuters and the brevity readers expect online.

## Core Information
- Lead with the most newsworthy development
- Name the key stakeholders and what they did
- Include critical numbers or data when relevant
- Explain why this matters now and the immediate implications

## Style
- Strong, active verbs
- Specific rather than general
- Journalistic objectivity
- Every word earns its place
- Explain technical terms when needed

## Format
A single paragraph of 250-400 words that informs and engages.
Pattern: [Major News] + [Key Details/Data] + [Why It Matters/What's Next]
Answer: What happened? Why is it significant? What is the impact?

IMPORTANT: Output ONLY the summary paragraph. No introductory phrases, labels or meta-text such as "Here's a summary". Start directly with the news."#;

pub struct SummarizerAgent;

impl SummarizerAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SummarizerAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsAgent for SummarizerAgent {
    fn name(&self) -> &str {
        "summarizer"
    }

    fn description(&self) -> &str {
        "News Summarizer"
    }

    fn instructions(&self) -> &str {
        INSTRUCTIONS
    }

    fn input_template(&self) -> &str {
        "Summarize this synthesis:\n{input}"
    }
}
