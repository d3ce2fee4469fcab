//! Web search capability consumed by the first pipeline stage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Return up to `max_results` hits in ranking order. An empty vector means
    /// nothing was found and is not an error.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, Error>;
}

/// Flatten hits into the newline-delimited block handed to the next stage.
pub fn format_hits(topic: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No news found for {}.", topic);
    }

    hits.iter()
        .map(|hit| {
            format!(
                "Title: {}\nURL: {}\nSummary: {}",
                hit.title, hit.url, hit.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hits() {
        let hits = vec![
            SearchHit::new("A", "https://a.example", "first"),
            SearchHit::new("B", "https://b.example", "second"),
        ];
        assert_eq!(
            format_hits("AI Agents", &hits),
            "Title: A\nURL: https://a.example\nSummary: first\n\n\
             Title: B\nURL: https://b.example\nSummary: second"
        );
    }

    #[test]
    fn test_format_hits_empty() {
        assert_eq!(format_hits("Quantum", &[]), "No news found for Quantum.");
    }

    #[test]
    fn test_format_hits_empty_topic() {
        assert_eq!(format_hits("", &[]), "No news found for .");
    }
}
