//! Searcher preset, used to tidy raw search hits when refinement is enabled.

use crate::NewsAgent;

const INSTRUCTIONS: &str = r#"You are a news search specialist. You receive raw web search hits for a topic.

Your job:
1. Keep the hits most relevant to the topic and most recent
2. Prefer reputable sources and drop obvious spam or unrelated pages
3. Return the remaining hits in a structured format: Title, URL and Summary for each, separated by a blank line

Do not invent articles, URLs or details that are not in the hits."#;

pub struct SearcherAgent;

impl SearcherAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearcherAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsAgent for SearcherAgent {
    fn name(&self) -> &str {
        "searcher"
    }

    fn description(&self) -> &str {
        "News Searcher"
    }

    fn instructions(&self) -> &str {
        INSTRUCTIONS
    }

    fn input_template(&self) -> &str {
        "Find recent news about {topic}:\n{input}"
    }
}
