//! qn-core: Core types and the summarization pipeline for quick-news
//!
//! This crate provides the capability traits (search, chat completion,
//! generation), the shared topic store, and the three-stage pipeline runner
//! that ties them together.

pub mod error;
pub mod generate;
pub mod message;
pub mod pipeline;
pub mod provider;
pub mod search;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::Error;
pub use generate::{Generator, ProviderGenerator};
pub use message::{strip_thinking_tags, Message, Role, Usage};
pub use pipeline::{
    search_query, PipelineConfig, PipelineError, PipelineRunner, Preset, Stage, StagePresets,
    DEFAULT_MAX_RESULTS,
};
pub use provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
pub use search::{format_hits, SearchHit, SearchProvider};
pub use store::{NewsState, RunPhase, TopicStore, DEFAULT_TOPIC};

pub type Result<T> = std::result::Result<T, Error>;
