//! DuckDuckGo HTML endpoint.
//!
//! Posts the query to `html.duckduckgo.com`, which renders results server
//! side, and scrapes titles, links and snippets out of the returned page.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

use qn_core::{Error, SearchHit, SearchProvider};

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Marker present on the bot-check page served instead of results.
const ANOMALY_MARKER: &str = "anomaly-modal";

pub struct DuckDuckGoSearch {
    client: Client,
    config: SearchConfig,
}

impl DuckDuckGoSearch {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn form_params<'a>(&'a self, query: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("q", query)];
        if self.config.safe_search {
            params.push(("kp", "1"));
        }
        if let Some(region) = self.config.region.as_deref() {
            params.push(("kl", region));
        }
        params
    }

    async fn fetch(&self, query: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&self.form_params(query))
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Http(format!(
                        "request timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    SearchError::Http(format!("request failed: {e}"))
                }
            })?
            .error_for_status()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("failed to read response: {e}")))
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, Error> {
        trace!(query, max_results, "DuckDuckGo search");
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let html = self.fetch(query).await?;
        trace!(bytes = html.len(), "DuckDuckGo response received");

        Ok(parse_results(&html, max_results)?)
    }
}

/// Unwrap DuckDuckGo's `/l/?uddg=` redirect links into the target URL.
///
/// Protocol-relative links get `https:`. Anything unparsable yields `None`.
pub fn extract_url(href: &str) -> Option<String> {
    let href = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&href).ok()?;
    let is_redirect = matches!(
        parsed.host_str(),
        Some("duckduckgo.com") | Some("html.duckduckgo.com")
    ) && parsed.path().starts_with("/l/");

    if is_redirect {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else {
        Some(href)
    }
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector {css:?}: {e:?}")))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a results page into at most `max_results` hits, ads excluded.
///
/// A page with no organic results parses to an empty list.
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
    if html.contains(ANOMALY_MARKER) {
        return Err(SearchError::Blocked(
            "DuckDuckGo returned a bot-check page".into(),
        ));
    }

    let document = Html::parse_document(html);
    let result_sel = selector(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for element in document.select(&result_sel) {
        if hits.len() >= max_results {
            break;
        }

        let Some(link) = element.select(&title_sel).next() else {
            continue;
        };
        let title = collapse_whitespace(&link.text().collect::<String>());
        if title.is_empty() {
            continue;
        }
        let Some(url) = link.value().attr("href").and_then(extract_url) else {
            continue;
        };
        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();

        hits.push(SearchHit::new(title, url, snippet));
    }

    debug!(count = hits.len(), "DuckDuckGo results parsed");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<div class="result results_links results_links_deep result--ad">
    <a class="result__a" href="https://ads.example.com/">Sponsored agent platform</a>
    <div class="result__snippet">Buy now.</div>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fnews.example.com%2Fagents&amp;rut=abc123">
        Agents ship in
        production
    </a>
    <div class="result__snippet">
        Several vendors released   agent frameworks this month.
    </div>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://blog.example.org/llm-tools">Tool use roundup</a>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://third.example.net/">Third story</a>
    <div class="result__snippet">Third snippet.</div>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://fourth.example.net/">Fourth story</a>
    <div class="result__snippet">Fourth snippet.</div>
</div>
</body>
</html>"#;

    #[test]
    fn extract_url_unwraps_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage%3Fa%3D1&rut=x";
        assert_eq!(
            extract_url(href),
            Some("https://example.com/page?a=1".to_string())
        );
    }

    #[test]
    fn extract_url_keeps_direct_link() {
        assert_eq!(
            extract_url("https://example.com/direct"),
            Some("https://example.com/direct".to_string())
        );
    }

    #[test]
    fn extract_url_rejects_garbage() {
        assert_eq!(extract_url("not a url"), None);
        assert_eq!(extract_url("//duckduckgo.com/l/?rut=only"), None);
    }

    #[test]
    fn parse_skips_ads_and_caps_results() {
        let hits = parse_results(RESULTS_PAGE, 3).unwrap();
        assert_eq!(hits.len(), 3);

        assert_eq!(hits[0].title, "Agents ship in production");
        assert_eq!(hits[0].url, "https://news.example.com/agents");
        assert_eq!(
            hits[0].snippet,
            "Several vendors released agent frameworks this month."
        );
        assert!(hits.iter().all(|h| !h.url.contains("ads.example.com")));
    }

    #[test]
    fn parse_missing_snippet_is_empty() {
        let hits = parse_results(RESULTS_PAGE, 5).unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[1].title, "Tool use roundup");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn parse_no_results_page() {
        let html = r#"<html><body><div class="no-results">No results.</div></body></html>"#;
        assert!(parse_results(html, 3).unwrap().is_empty());
    }

    #[test]
    fn parse_bot_check_page_is_error() {
        let html = r#"<html><body><div class="anomaly-modal__title">Unfortunately, bots use DuckDuckGo too.</div></body></html>"#;
        let err = parse_results(html, 3).unwrap_err();
        assert!(matches!(err, SearchError::Blocked(_)));
    }

    #[test]
    fn form_params_follow_config() {
        let search = DuckDuckGoSearch::new(SearchConfig {
            safe_search: true,
            region: Some("us-en".into()),
            ..Default::default()
        })
        .unwrap();
        let params = search.form_params("AI Agents news 2026-10");
        assert_eq!(
            params,
            vec![
                ("q", "AI Agents news 2026-10"),
                ("kp", "1"),
                ("kl", "us-en")
            ]
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let result = DuckDuckGoSearch::new(SearchConfig {
            timeout_secs: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[tokio::test]
    async fn zero_max_results_skips_request() {
        let search = DuckDuckGoSearch::new(SearchConfig {
            endpoint: "http://127.0.0.1:9/unreachable".into(),
            ..Default::default()
        })
        .unwrap();
        let hits = search.search("anything", 0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    #[ignore = "hits the live DuckDuckGo endpoint"]
    async fn live_search() {
        let search = DuckDuckGoSearch::new(SearchConfig::default()).unwrap();
        let hits = search.search("rust programming language", 3).await.unwrap();
        assert!(hits.len() <= 3);
    }
}
