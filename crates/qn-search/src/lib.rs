//! qn-search: Web search for quick-news
//!
//! Scrapes the HTML-only DuckDuckGo endpoint, which needs no API key, and
//! exposes it through the `SearchProvider` capability from `qn-core`.

pub mod config;
pub mod duckduckgo;
pub mod error;

pub use config::SearchConfig;
pub use duckduckgo::DuckDuckGoSearch;
pub use error::SearchError;
