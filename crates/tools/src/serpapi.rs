//! Precise-search adapter over the SerpAPI JSON endpoint.

use async_trait::async_trait;
use prospector_core::collab::SearchProvider;
use prospector_core::error::ToolError;
use prospector_core::tool::PRECISE_SEARCH;
use tracing::debug;

const MAX_RESULTS: usize = 5;

/// Google results via serpapi.com.
pub struct SerpApiSearch {
    api_key: String,
    client: reqwest::Client,
}

impl SerpApiSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.into(),
            client,
        }
    }

    fn exec_failed(reason: String) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: PRECISE_SEARCH.into(),
            reason,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str) -> Result<String, ToolError> {
        let url = format!(
            "https://serpapi.com/search.json?q={}&api_key={}",
            urlencoding::encode(query),
            self.api_key
        );
        debug!(query, "SerpAPI search");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::exec_failed(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::exec_failed(format!("HTTP {status}")));
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Self::exec_failed(format!("bad response body: {e}")))?;

        Ok(format_organic_results(&body))
    }
}

/// Extract titles, snippets, and links from the `organic_results` array.
fn format_organic_results(body: &serde_json::Value) -> String {
    let mut results = Vec::new();
    if let Some(organic) = body.get("organic_results").and_then(|r| r.as_array()) {
        for res in organic.iter().take(MAX_RESULTS) {
            let title = res.get("title").and_then(|v| v.as_str()).unwrap_or("(untitled)");
            let snippet = res.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
            let link = res.get("link").and_then(|v| v.as_str()).unwrap_or("");
            results.push(format!("### {title}\n{snippet}\nSource: {link}"));
        }
    }
    if results.is_empty() {
        "No results found.".to_string()
    } else {
        results.join("\n\n")
    }
}
