use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qn_agents::{build_presets, builtin_agents, AgentOverride, NewsAgent};
use qn_core::{
    Generator, PipelineRunner, Provider, ProviderGenerator, RunPhase, Stage, TopicStore,
};
use qn_providers::OpenAIProvider;
use qn_search::DuckDuckGoSearch;

mod config;
mod run;
mod server;
mod setup;

use config::Config;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Everything, including search scraping details
    Trace,
    /// Stage boundaries and request bodies
    Debug,
    /// Run start and outcome
    Info,
    /// Only failed runs and warnings
    Warn,
    /// Only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "qn")]
#[command(author, version, about = "Quick-news: search, synthesize and summarize the news on a topic", long_about = None)]
pub struct Cli {
    /// Model to use (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// OpenAI-compatible base URL (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log level for tracing output
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the news page (default)
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the pipeline once and print each stage
    Run {
        /// Topic to summarize (defaults to the configured topic)
        topic: Option<String>,
    },
    /// Show current configuration
    Config,
    /// Write a starter configuration to ~/.config/qn
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --debug overrides --log-level
    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    let filter = EnvFilter::new(log_level.as_filter());

    if let Some(log_path) = &cli.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let (model, base_url) = (cli.model.as_deref(), cli.base_url.as_deref());
    match cli.command {
        // Setup must work before a valid config exists
        Some(Commands::Setup) => setup::run(),
        Some(Commands::Config) => show_config(&load_config(model, base_url)?),
        Some(Commands::Run { topic }) => {
            let config = load_config(model, base_url)?;
            let topic = topic.unwrap_or_else(|| config.default_topic.clone());
            let runner = Arc::new(build_runner(&config)?);
            let phase = run::run(runner, topic).await?;
            if phase == RunPhase::Failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Serve { host, port }) => serve(&load_config(model, base_url)?, host, port).await,
        None => serve(&load_config(model, base_url)?, None, None).await,
    }
}

/// Load the config file and apply the global CLI overrides.
fn load_config(model: Option<&str>, base_url: Option<&str>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(model) = model {
        config.provider.model = model.to_string();
    }
    if let Some(base_url) = base_url {
        config.provider.base_url = base_url.to_string();
    }
    Ok(config)
}

async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    let runner = Arc::new(build_runner(config)?);
    server::serve(addr, server::AppState::new(runner)).await
}

/// Construct the capabilities once and wire them into a runner.
fn build_runner(config: &Config) -> Result<PipelineRunner> {
    let provider: Arc<dyn Provider> = Arc::new(
        OpenAIProvider::new(config.provider.resolve_api_key())
            .with_base_url(config.provider.base_url.as_str())
            .with_default_model(config.provider.model.as_str()),
    );

    let search = DuckDuckGoSearch::new(config.search_config())
        .context("Failed to create search client")?;

    let generator = generator_for(config, &provider, None);
    let store = TopicStore::new(config.default_topic.clone());

    let mut runner = PipelineRunner::new(
        store,
        Arc::new(search),
        generator,
        build_presets(&config.agents),
    )
    .with_config(config.pipeline_config());

    for (stage, agent) in [
        (Stage::Search, config.agents.searcher.as_ref()),
        (Stage::Synthesize, config.agents.synthesizer.as_ref()),
        (Stage::Summarize, config.agents.summarizer.as_ref()),
    ] {
        if let Some(agent) = agent.filter(|a| a.overrides_generation()) {
            info!(%stage, model = ?agent.model, "Using stage-specific generator");
            runner = runner.with_stage_generator(stage, generator_for(config, &provider, Some(agent)));
        }
    }

    Ok(runner)
}

fn generator_for(
    config: &Config,
    provider: &Arc<dyn Provider>,
    agent: Option<&AgentOverride>,
) -> Arc<dyn Generator> {
    let model = agent
        .and_then(|a| a.model.clone())
        .unwrap_or_else(|| config.provider.model.clone());
    let mut generator = ProviderGenerator::new(Arc::clone(provider))
        .with_model(model)
        .with_parameters(config.provider.parameters.clone());

    if let Some(temperature) = agent
        .and_then(|a| a.temperature)
        .or(config.provider.temperature)
    {
        generator = generator.with_temperature(temperature);
    }
    Arc::new(generator)
}

fn show_config(config: &Config) -> Result<()> {
    println!("# {}", Config::config_path()?.display());
    print!("{}", render_config(config)?);
    Ok(())
}

/// Effective config as TOML (API key masked) followed by the agent list.
fn render_config(config: &Config) -> Result<String> {
    let mut out = toml::to_string_pretty(&config.redacted())
        .context("Failed to render configuration")?;

    out.push_str("\n# Agents\n");
    for agent in builtin_agents() {
        let overridden = config.agents.get(agent.name()).is_some();
        out.push_str(&format!(
            "#   {:<12} {}{}\n",
            agent.name(),
            agent.description(),
            if overridden { " (overridden)" } else { "" }
        ));
    }
    Ok(out)
}
