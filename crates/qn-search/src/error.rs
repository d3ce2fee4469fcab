//! Error types for search operations.

/// Errors that can occur while querying the search engine.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The engine answered with a bot-check page instead of results.
    #[error("search engine blocked the request: {0}")]
    Blocked(String),

    /// The response HTML could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<SearchError> for qn_core::Error {
    fn from(err: SearchError) -> Self {
        qn_core::Error::search(err.to_string())
    }
}
