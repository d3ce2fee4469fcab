//! Shared topic store.
//!
//! Holds the current topic and the output of every pipeline stage. All writes
//! go through [`TopicStore::commit`], which applies a field-group update under
//! exclusive access and then wakes every subscriber, so renderers observe
//! whole commits only and can refresh after each stage.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Error;
use crate::pipeline::Stage;

pub const DEFAULT_TOPIC: &str = "AI Agents";

/// Lifecycle of the most recent run, derived from the store fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed)
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Running => write!(f, "running"),
            RunPhase::Completed => write!(f, "completed"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of everything the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsState {
    pub topic: String,
    pub raw_result: String,
    pub synthesized_result: String,
    pub final_summary: String,
    pub is_running: bool,
    pub error_message: String,
    /// Incremented on every commit.
    pub revision: u64,
}

impl NewsState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            raw_result: String::new(),
            synthesized_result: String::new(),
            final_summary: String::new(),
            is_running: false,
            error_message: String::new(),
            revision: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        if self.is_running {
            RunPhase::Running
        } else if !self.error_message.is_empty() {
            RunPhase::Failed
        } else if !self.final_summary.is_empty() {
            RunPhase::Completed
        } else {
            RunPhase::Idle
        }
    }

    fn reset_outputs(&mut self) {
        self.is_running = true;
        self.error_message.clear();
        self.raw_result.clear();
        self.synthesized_result.clear();
        self.final_summary.clear();
    }
}

impl Default for NewsState {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}

/// Process-wide store for one user session. Cloning shares the same state.
#[derive(Clone)]
pub struct TopicStore {
    tx: Arc<watch::Sender<NewsState>>,
}

impl Default for TopicStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}

impl TopicStore {
    pub fn new(topic: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(NewsState::new(topic));
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> NewsState {
        self.tx.borrow().clone()
    }

    /// Receiver woken after every commit.
    pub fn subscribe(&self) -> watch::Receiver<NewsState> {
        self.tx.subscribe()
    }

    /// Replace the topic. No validation: an empty topic is accepted.
    ///
    /// Setting the value already held does nothing and notifies no one.
    /// Returns whether the topic changed.
    pub fn set_topic(&self, topic: impl Into<String>) -> bool {
        let topic = topic.into();
        self.tx.send_if_modified(|state| {
            if state.topic == topic {
                return false;
            }
            state.topic = topic;
            state.revision += 1;
            true
        })
    }

    /// Apply `update` under exclusive access, bump the revision and notify.
    pub fn commit<F>(&self, update: F)
    where
        F: FnOnce(&mut NewsState),
    {
        self.tx.send_modify(|state| {
            update(state);
            state.revision += 1;
        });
    }

    /// Reset the store for a new run and return the topic to run with.
    ///
    /// Fails with [`Error::RunInProgress`] while another run holds the store.
    pub fn begin_run(&self) -> Result<String, Error> {
        self.try_begin(None)
    }

    /// Like [`TopicStore::begin_run`], but writes `topic` first in the same commit.
    pub fn begin_run_with_topic(&self, topic: impl Into<String>) -> Result<String, Error> {
        self.try_begin(Some(topic.into()))
    }

    fn try_begin(&self, topic: Option<String>) -> Result<String, Error> {
        let mut captured = None;
        self.tx.send_if_modified(|state| {
            if state.is_running {
                return false;
            }
            if let Some(topic) = topic {
                state.topic = topic;
            }
            state.reset_outputs();
            state.revision += 1;
            captured = Some(state.topic.clone());
            true
        });
        captured.ok_or(Error::RunInProgress)
    }

    /// Store a stage output. The summarize stage also ends the run.
    pub fn commit_stage(&self, stage: Stage, output: String) {
        self.commit(|state| match stage {
            Stage::Search => state.raw_result = output,
            Stage::Synthesize => state.synthesized_result = output,
            Stage::Summarize => {
                state.final_summary = output;
                state.is_running = false;
            }
        });
    }

    /// Record a failed run. Stage outputs already committed are kept.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.commit(|state| {
            state.error_message = message;
            state.is_running = false;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topic() {
        let store = TopicStore::default();
        let state = store.snapshot();
        assert_eq!(state.topic, "AI Agents");
        assert_eq!(state.phase(), RunPhase::Idle);
        assert_eq!(state.revision, 0);
    }

    #[test]
    fn test_set_topic_accepts_empty() {
        let store = TopicStore::default();
        assert!(store.set_topic(""));
        assert_eq!(store.snapshot().topic, "");
    }

    #[test]
    fn test_set_topic_idempotent() {
        let store = TopicStore::default();
        let mut rx = store.subscribe();

        assert!(store.set_topic("Rust"));
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();
        let revision = store.snapshot().revision;

        assert!(!store.set_topic("Rust"));
        assert!(!rx.has_changed().unwrap());

        let state = store.snapshot();
        assert_eq!(state.topic, "Rust");
        assert_eq!(state.revision, revision);
        assert!(!state.is_running);
        assert_eq!(state.phase(), RunPhase::Idle);
    }

    #[test]
    fn test_begin_run_resets_outputs() {
        let store = TopicStore::default();
        store.commit(|state| {
            state.raw_result = "old raw".into();
            state.synthesized_result = "old synthesis".into();
            state.final_summary = "old summary".into();
            state.error_message = "old error".into();
        });

        let topic = store.begin_run().unwrap();
        assert_eq!(topic, "AI Agents");

        let state = store.snapshot();
        assert!(state.is_running);
        assert!(state.raw_result.is_empty());
        assert!(state.synthesized_result.is_empty());
        assert!(state.final_summary.is_empty());
        assert!(state.error_message.is_empty());
        assert_eq!(state.phase(), RunPhase::Running);
    }

    #[test]
    fn test_begin_run_rejected_while_running() {
        let store = TopicStore::default();
        store.begin_run().unwrap();
        let revision = store.snapshot().revision;

        let err = store.begin_run_with_topic("Other").unwrap_err();
        assert!(matches!(err, Error::RunInProgress));

        let state = store.snapshot();
        assert_eq!(state.topic, "AI Agents");
        assert_eq!(state.revision, revision);
    }

    #[test]
    fn test_begin_run_with_topic_writes_topic() {
        let store = TopicStore::default();
        assert_eq!(store.begin_run_with_topic("Climate").unwrap(), "Climate");
        assert_eq!(store.snapshot().topic, "Climate");
    }

    #[test]
    fn test_commit_stage_progression() {
        let store = TopicStore::default();
        store.begin_run().unwrap();

        store.commit_stage(Stage::Search, "raw".into());
        assert!(store.snapshot().is_running);

        store.commit_stage(Stage::Synthesize, "synth".into());
        assert!(store.snapshot().is_running);

        store.commit_stage(Stage::Summarize, "summary".into());
        let state = store.snapshot();
        assert!(!state.is_running);
        assert_eq!(state.final_summary, "summary");
        assert_eq!(state.phase(), RunPhase::Completed);
    }

    #[test]
    fn test_fail_keeps_partial_results() {
        let store = TopicStore::default();
        store.begin_run().unwrap();
        store.commit_stage(Stage::Search, "raw".into());
        store.fail("An error occurred: boom");

        let state = store.snapshot();
        assert_eq!(state.raw_result, "raw");
        assert_eq!(state.error_message, "An error occurred: boom");
        assert!(!state.is_running);
        assert_eq!(state.phase(), RunPhase::Failed);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn test_terminal_store_can_run_again() {
        let store = TopicStore::default();
        store.begin_run().unwrap();
        store.fail("An error occurred: boom");
        assert!(store.begin_run().is_ok());
        assert!(store.snapshot().error_message.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let store = TopicStore::default();
        let other = store.clone();
        other.set_topic("Shared");
        assert_eq!(store.snapshot().topic, "Shared");
    }
}
