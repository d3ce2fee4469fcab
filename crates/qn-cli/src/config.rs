use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use qn_agents::AgentsConfig;
use qn_core::{PipelineConfig, DEFAULT_MAX_RESULTS, DEFAULT_TOPIC};
use qn_providers::OLLAMA_BASE_URL;
use qn_search::SearchConfig;

/// Placeholder key accepted by Ollama, which ignores authentication.
pub const PLACEHOLDER_API_KEY: &str = "ollama";

pub const DEFAULT_MODEL: &str = "llama3.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Topic the store starts with.
    pub default_topic: String,
    pub provider: ProviderSettings,
    pub search: SearchSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
    pub agents: AgentsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_topic: DEFAULT_TOPIC.to_string(),
            provider: ProviderSettings::default(),
            search: SearchSettings::default(),
            pipeline: PipelineSettings::default(),
            server: ServerSettings::default(),
            agents: AgentsConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key. Falls back to OPENAI_API_KEY, then to the Ollama placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Extra request body fields (e.g. `keep_alive` for Ollama).
    pub parameters: HashMap<String, serde_json::Value>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            parameters: HashMap::new(),
        }
    }
}

impl ProviderSettings {
    pub fn resolve_api_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
    pub timeout_secs: u64,
    pub safe_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let engine = SearchConfig::default();
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: engine.timeout_secs,
            safe_search: engine.safe_search,
            region: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub refine_search: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Load from ~/.config/qn/config.toml (optional) and `QN_` env vars.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = Self::figment(path)
            .merge(Env::prefixed("QN_").split("__"))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults layered under the TOML file. A missing file is not an error.
    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.max_results == 0 {
            anyhow::bail!("search.max_results must be greater than 0");
        }
        if self.provider.base_url.trim().is_empty() {
            anyhow::bail!("provider.base_url must not be empty");
        }
        self.search_config()
            .validate()
            .context("Invalid [search] section")?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("qn"))
    }

    pub fn search_config(&self) -> SearchConfig {
        let mut config = SearchConfig {
            timeout_secs: self.search.timeout_secs,
            safe_search: self.search.safe_search,
            region: self.search.region.clone(),
            ..SearchConfig::default()
        };
        if let Some(user_agent) = &self.search.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_results: self.search.max_results,
            refine_search: self.pipeline.refine_search,
        }
    }

    /// Config rendered as TOML with the API key masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(key) = &config.provider.api_key {
            config.provider.api_key = Some(mask_key(key));
        }
        config
    }
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
