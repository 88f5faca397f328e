//! Broad-discovery adapter over the Brave Search API.
//!
//! Discovery casts a wider net than precise search: more results, and the
//! task context is folded into the query to bias toward candidate lists
//! rather than single facts.

use async_trait::async_trait;
use prospector_core::collab::DiscoveryProvider;
use prospector_core::error::ToolError;
use prospector_core::text::truncate;
use prospector_core::tool::BROAD_DISCOVER;
use tracing::debug;

const MAX_RESULTS: usize = 8;

/// Web discovery via api.search.brave.com.
pub struct BraveDiscovery {
    api_key: String,
    client: reqwest::Client,
}

impl BraveDiscovery {
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
            tool_name: BROAD_DISCOVER.into(),
            reason,
        }
    }
}

#[async_trait]
impl DiscoveryProvider for BraveDiscovery {
    fn name(&self) -> &str {
        "brave"
    }

    async fn discover(&self, query: &str, context: &str) -> Result<String, ToolError> {
        let effective = combine_query(query, context);
        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&count={MAX_RESULTS}",
            urlencoding::encode(&effective)
        );
        debug!(query = %effective, "Brave discovery");

        let resp = self
            .client
            .get(url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
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

        Ok(format_web_results(&body))
    }
}

/// Fold the task context into the query; Brave has no separate context field.
fn combine_query(query: &str, context: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        query.to_string()
    } else {
        format!("{query} {}", truncate(context, 120))
    }
}

fn format_web_results(body: &serde_json::Value) -> String {
    let mut results = Vec::new();
    if let Some(items) = body
        .pointer("/web/results")
        .and_then(|r| r.as_array())
    {
        for item in items.iter().take(MAX_RESULTS) {
            let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("(untitled)");
            let url = item.get("url").and_then(|v| v.as_str()).unwrap_or("");
            let desc = item
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            results.push(format!("### {title}\n{desc}\nSource: {url}"));
        }
    }
    if results.is_empty() {
        "No candidates discovered.".to_string()
    } else {
        results.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_folds_into_query() {
        assert_eq!(combine_query("bulk sms", ""), "bulk sms");
        assert_eq!(
            combine_query("bulk sms", "coverage in Argentina"),
            "bulk sms coverage in Argentina"
        );
    }

    #[test]
    fn long_context_is_bounded() {
        let combined = combine_query("q", &"word ".repeat(100));
        assert!(combined.chars().count() < 130);
    }

    #[test]
    fn formats_web_results() {
        let body = serde_json::json!({
            "web": {
                "results": [
                    {"title": "Top SMS providers", "url": "https://list.example", "description": "A roundup"}
                ]
            }
        });
        let out = format_web_results(&body);
        assert!(out.contains("Top SMS providers"));
        assert!(out.contains("https://list.example"));
    }

    #[test]
    fn empty_results_say_so() {
        assert_eq!(
            format_web_results(&serde_json::json!({})),
            "No candidates discovered."
        );
    }
}
