//! Per-agent overrides read from the `[agents.*]` config sections.

use serde::{Deserialize, Serialize};

use qn_core::Preset;

use crate::NewsAgent;

/// Overrides for one built-in agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AgentOverride {
    /// Replaces the built-in instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Model for this agent's stage (defaults to the provider model).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl AgentOverride {
    /// Whether this override needs its own generator.
    pub fn overrides_generation(&self) -> bool {
        self.model.is_some() || self.temperature.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AgentsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searcher: Option<AgentOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<AgentOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarizer: Option<AgentOverride>,
}

impl AgentsConfig {
    /// Look up the override for an agent by name.
    pub fn get(&self, name: &str) -> Option<&AgentOverride> {
        match name {
            "searcher" => self.searcher.as_ref(),
            "synthesizer" => self.synthesizer.as_ref(),
            "summarizer" => self.summarizer.as_ref(),
            _ => None,
        }
    }

    /// The agent's preset with any instruction override applied.
    pub fn apply(&self, agent: &dyn NewsAgent) -> Preset {
        let mut preset = agent.to_preset();
        if let Some(instructions) = self.get(agent.name()).and_then(|o| o.instructions.clone()) {
            preset.instructions = instructions;
        }
        preset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SummarizerAgent, SynthesizerAgent};

    #[test]
    fn test_parse_agents_section() {
        let config: AgentsConfig = toml::from_str(
            r#"
[summarizer]
instructions = "Two sentences."
model = "qwen3"

[synthesizer]
temperature = 0.2
"#,
        )
        .unwrap();

        let summarizer = config.get("summarizer").unwrap();
        assert_eq!(summarizer.instructions.as_deref(), Some("Two sentences."));
        assert_eq!(summarizer.model.as_deref(), Some("qwen3"));
        assert!(summarizer.overrides_generation());

        let synthesizer = config.get("synthesizer").unwrap();
        assert_eq!(synthesizer.temperature, Some(0.2));
        assert!(synthesizer.instructions.is_none());

        assert!(config.searcher.is_none());
        assert!(config.get("unknown").is_none());
    }

    #[test]
    fn test_instruction_only_override_keeps_shared_generator() {
        let o = AgentOverride {
            instructions: Some("x".into()),
            ..Default::default()
        };
        assert!(!o.overrides_generation());
    }

    #[test]
    fn test_apply_without_override_keeps_builtin() {
        let config = AgentsConfig::default();
        let preset = config.apply(&SynthesizerAgent::new());
        assert_eq!(preset.name, "synthesizer");
        assert_eq!(preset.instructions, SynthesizerAgent::new().instructions());
    }

    #[test]
    fn test_apply_keeps_input_template() {
        let config = AgentsConfig {
            summarizer: Some(AgentOverride {
                instructions: Some("Short.".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let preset = config.apply(&SummarizerAgent::new());
        assert_eq!(preset.instructions, "Short.");
        assert_eq!(preset.input_template, "Summarize this synthesis:\n{input}");
    }
}
