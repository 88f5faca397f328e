//! Fetch-only page reader.
//!
//! Retrieves a page with a bounded timeout, strips markup down to readable
//! text, and caps the output with a truncation notice. Used directly by the
//! `read_page` tool and as the fetch half of the distiller.

use async_trait::async_trait;
use prospector_core::collab::PageReader;
use prospector_core::error::ToolError;
use prospector_core::text::truncate_with_notice;
use prospector_core::tool::READ_PAGE;
use tracing::debug;

const USER_AGENT: &str = concat!("prospector/", env!("CARGO_PKG_VERSION"));

pub struct HttpPageReader {
    client: reqwest::Client,
    char_cap: usize,
}

impl HttpPageReader {
    pub fn new(timeout_secs: u64, char_cap: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, char_cap }
    }

    fn exec_failed(reason: String) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: READ_PAGE.into(),
            reason,
        }
    }
}

#[async_trait]
impl PageReader for HttpPageReader {
    async fn read(&self, url: &str) -> Result<String, ToolError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments {
                tool_name: READ_PAGE.into(),
                reason: "URL must start with http:// or https://".into(),
            });
        }

        debug!(url, "Fetching page");
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
        let html = resp
            .text()
            .await
            .map_err(|e| Self::exec_failed(format!("body read failed: {e}")))?;

        Ok(truncate_with_notice(&html_to_text(&html), self.char_cap))
    }
}

/// Strip HTML down to readable text: drop script/style blocks, remove tags,
/// decode the common entities, collapse whitespace.
pub fn html_to_text(html: &str) -> String {
    let without_blocks = strip_block(&strip_block(html, "script"), "style");

    let without_tags = without_blocks
        .split('<')
        .map(|part| match part.find('>') {
            Some(pos) => &part[pos + 1..],
            None => part,
        })
        .collect::<Vec<_>>()
        .join(" ");

    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `<tag ...>...</tag>` sections, ASCII-case-insensitively.
///
/// Byte-wise search: lowercasing the document would shift offsets for some
/// Unicode text.
fn strip_block(html: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = find_ascii_ci(html, &open, pos) {
        out.push_str(&html[pos..start]);
        match find_ascii_ci(html, &close, start) {
            Some(end) => pos = end + close.len(),
            None => {
                // unclosed block — drop the rest
                return out;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Byte-offset of `needle` in `haystack[from..]`, ignoring ASCII case.
/// The returned offset is always a char boundary because the needle's first
/// byte is ASCII.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ndl = needle.as_bytes();
    if ndl.is_empty() || hay.len() < ndl.len() {
        return None;
    }
    (from..=hay.len() - ndl.len()).find(|&i| hay[i..i + ndl.len()].eq_ignore_ascii_case(ndl))
}
