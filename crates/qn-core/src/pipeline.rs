//! Three-stage news summarization pipeline.
//!
//! A run resets the [`TopicStore`], then executes Search -> Synthesize ->
//! Summarize strictly in order. Each stage output is committed to the store
//! as soon as it is available so observers can render progressively. The
//! first failing stage ends the run: its error is recorded in
//! `error_message` and outputs committed so far stay visible. No stage is
//! retried.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::generate::Generator;
use crate::search::{format_hits, SearchProvider};
use crate::store::{RunPhase, TopicStore};

pub const DEFAULT_MAX_RESULTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Synthesize,
    Summarize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Search => write!(f, "search"),
            Stage::Synthesize => write!(f, "synthesize"),
            Stage::Summarize => write!(f, "summarize"),
        }
    }
}

/// A stage failure as surfaced to the user.
#[derive(Debug, Error)]
#[error("An error occurred: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }
}

/// Fixed instructions plus the template that wraps a stage input.
///
/// `input_template` may reference `{topic}` and `{input}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: String,
    pub instructions: String,
    pub input_template: String,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        input_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            input_template: input_template.into(),
        }
    }

    /// Substitute both placeholders in one pass over the template, so
    /// placeholder text inside `topic` or `input` is kept literally.
    pub fn render_input(&self, topic: &str, input: &str) -> String {
        let mut out = String::with_capacity(self.input_template.len() + topic.len() + input.len());
        let mut rest = self.input_template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{topic}") {
                out.push_str(topic);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{input}") {
                out.push_str(input);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Presets for the generation calls, keyed by the stage that uses them.
///
/// The searcher preset is only used when search refinement is enabled.
#[derive(Debug, Clone)]
pub struct StagePresets {
    pub searcher: Preset,
    pub synthesizer: Preset,
    pub summarizer: Preset,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_results: usize,
    /// Pass the flattened search hits through the searcher preset before
    /// committing them as the raw result.
    pub refine_search: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            refine_search: false,
        }
    }
}

/// Build the search query for `topic`, qualified with the current month.
pub fn search_query(topic: &str, now: DateTime<Utc>) -> String {
    format!("{} news {}", topic, now.format("%Y-%m"))
}

/// Fails the run if dropped while armed, i.e. when a stage panicked or the
/// run future was dropped before reaching a terminal commit.
struct RunGuard<'a> {
    store: &'a TopicStore,
    armed: bool,
}

impl<'a> RunGuard<'a> {
    fn new(store: &'a TopicStore) -> Self {
        Self { store, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Pipeline run aborted before a terminal state");
            self.store.fail("An error occurred: stage panicked");
        }
    }
}

/// Runs the pipeline against one [`TopicStore`].
///
/// At most one run holds the store at a time: starting a run while
/// `is_running` is set fails with [`Error::RunInProgress`].
pub struct PipelineRunner {
    store: TopicStore,
    search: Arc<dyn SearchProvider>,
    generator: Arc<dyn Generator>,
    stage_generators: HashMap<Stage, Arc<dyn Generator>>,
    presets: StagePresets,
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(
        store: TopicStore,
        search: Arc<dyn SearchProvider>,
        generator: Arc<dyn Generator>,
        presets: StagePresets,
    ) -> Self {
        Self {
            store,
            search,
            generator,
            stage_generators: HashMap::new(),
            presets,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a dedicated generator for one stage (e.g. a different model).
    pub fn with_stage_generator(mut self, stage: Stage, generator: Arc<dyn Generator>) -> Self {
        self.stage_generators.insert(stage, generator);
        self
    }

    pub fn store(&self) -> &TopicStore {
        &self.store
    }

    /// Write `topic` to the store and run the pipeline to completion.
    ///
    /// Returns the terminal phase, or [`Error::RunInProgress`] if another run
    /// holds the store.
    pub async fn run(&self, topic: impl Into<String>) -> Result<RunPhase, Error> {
        let topic = self.store.begin_run_with_topic(topic)?;
        Ok(self.execute(&topic).await)
    }

    /// Start a background run for the topic currently in the store.
    ///
    /// The store is reset before this returns, so a second call made while
    /// the task is still running is rejected.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<RunPhase>, Error> {
        let topic = self.store.begin_run()?;
        let runner = Arc::clone(self);
        Ok(tokio::spawn(async move { runner.execute(&topic).await }))
    }

    async fn execute(&self, topic: &str) -> RunPhase {
        info!(topic, "Pipeline run started");
        let guard = RunGuard::new(&self.store);

        let phase = match self.run_stages(topic).await {
            Ok(()) => {
                info!(topic, "Pipeline run completed");
                RunPhase::Completed
            }
            Err(err) => {
                warn!(topic, stage = %err.stage, error = %err.source, "Pipeline run failed");
                self.store.fail(err.to_string());
                RunPhase::Failed
            }
        };
        guard.disarm();
        phase
    }

    async fn run_stages(&self, topic: &str) -> Result<(), PipelineError> {
        let raw = self
            .search_stage(topic)
            .await
            .map_err(|e| PipelineError::new(Stage::Search, e))?;
        self.commit(Stage::Search, &raw);

        let synthesized = self
            .generate(Stage::Synthesize, &self.presets.synthesizer, topic, &raw)
            .await?;
        self.commit(Stage::Synthesize, &synthesized);

        let summary = self
            .generate(Stage::Summarize, &self.presets.summarizer, topic, &synthesized)
            .await?;
        self.commit(Stage::Summarize, &summary);

        Ok(())
    }

    async fn search_stage(&self, topic: &str) -> Result<String, Error> {
        let query = search_query(topic, Utc::now());
        debug!(provider = self.search.name(), %query, "Searching");

        let hits = self.search.search(&query, self.config.max_results).await?;
        debug!(count = hits.len(), "Search returned");

        let flattened = format_hits(topic, &hits);
        if !self.config.refine_search {
            return Ok(flattened);
        }

        let preset = &self.presets.searcher;
        self.generator_for(Stage::Search)
            .generate(&preset.instructions, &preset.render_input(topic, &flattened))
            .await
    }

    async fn generate(
        &self,
        stage: Stage,
        preset: &Preset,
        topic: &str,
        input: &str,
    ) -> Result<String, PipelineError> {
        debug!(%stage, preset = %preset.name, input_len = input.len(), "Generating");
        self.generator_for(stage)
            .generate(&preset.instructions, &preset.render_input(topic, input))
            .await
            .map_err(|e| PipelineError::new(stage, e))
    }

    fn generator_for(&self, stage: Stage) -> &Arc<dyn Generator> {
        self.stage_generators.get(&stage).unwrap_or(&self.generator)
    }

    fn commit(&self, stage: Stage, output: &str) {
        debug!(%stage, output_len = output.len(), "Committing stage output");
        self.store.commit_stage(stage, output.to_string());
    }
}
