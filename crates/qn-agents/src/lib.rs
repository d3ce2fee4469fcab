//! Prompt presets for the quick-news pipeline.
//!
//! This crate provides:
//! - `NewsAgent` trait describing one stage's fixed instructions
//! - The built-in searcher, synthesizer and summarizer presets
//! - `AgentsConfig` for overriding presets from the config file

mod config;
mod searcher;
mod summarizer;
mod synthesizer;

pub use config::{AgentOverride, AgentsConfig};
pub use searcher::SearcherAgent;
pub use summarizer::SummarizerAgent;
pub use synthesizer::SynthesizerAgent;

use qn_core::{Preset, StagePresets};

/// A stage preset: fixed instructions plus the template its input is wrapped in.
pub trait NewsAgent: Send + Sync {
    /// Short identifier used in config sections (e.g. "summarizer").
    fn name(&self) -> &str;

    /// Human-readable description for display.
    fn description(&self) -> &str;

    fn instructions(&self) -> &str;

    /// Template for the user message. May reference `{topic}` and `{input}`.
    fn input_template(&self) -> &str;

    fn to_preset(&self) -> Preset {
        Preset::new(self.name(), self.instructions(), self.input_template())
    }
}

/// The built-in agents, in pipeline order.
pub fn builtin_agents() -> Vec<Box<dyn NewsAgent>> {
    vec![
        Box::new(SearcherAgent::new()),
        Box::new(SynthesizerAgent::new()),
        Box::new(SummarizerAgent::new()),
    ]
}

/// Presets with the built-in instructions.
pub fn default_presets() -> StagePresets {
    build_presets(&AgentsConfig::default())
}

/// Presets with instruction overrides from `config` applied.
pub fn build_presets(config: &AgentsConfig) -> StagePresets {
    StagePresets {
        searcher: config.apply(&SearcherAgent::new()),
        synthesizer: config.apply(&SynthesizerAgent::new()),
        summarizer: config.apply(&SummarizerAgent::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_agent_names() {
        let names: Vec<_> = builtin_agents().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["searcher", "synthesizer", "summarizer"]);
    }

    #[test]
    fn test_default_presets_input_templates() {
        let presets = default_presets();
        assert_eq!(
            presets.synthesizer.render_input("AI Agents", "raw"),
            "Synthesize these news articles:\nraw"
        );
        assert_eq!(
            presets.summarizer.render_input("AI Agents", "synth"),
            "Summarize this synthesis:\nsynth"
        );
        assert_eq!(
            presets.searcher.render_input("AI Agents", "hits"),
            "Find recent news about AI Agents:\nhits"
        );
    }

    #[test]
    fn test_all_agents_have_instructions() {
        for agent in builtin_agents() {
            assert!(!agent.instructions().trim().is_empty(), "{}", agent.name());
            assert!(!agent.description().is_empty(), "{}", agent.name());
            assert!(agent.input_template().contains("{input}"), "{}", agent.name());
        }
    }

    #[test]
    fn test_build_presets_applies_override() {
        let mut config = AgentsConfig::default();
        config.summarizer = Some(AgentOverride {
            instructions: Some("One sentence only.".into()),
            ..Default::default()
        });

        let presets = build_presets(&config);
        assert_eq!(presets.summarizer.instructions, "One sentence only.");
        assert_eq!(
            presets.synthesizer.instructions,
            SynthesizerAgent::new().instructions()
        );
    }
}
