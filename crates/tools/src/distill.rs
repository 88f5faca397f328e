//! Fetch-then-distill page extraction.
//!
//! Composes the page reader with the summarization collaborator: fetch the
//! page text, then distill just the facts relevant to the stated goal. The
//! distilled form is what usually enters the conversation — verbatim pages
//! go through `read_page` instead.

use async_trait::async_trait;
use prospector_core::collab::{PageExtractor, PageReader, Summarizer};
use prospector_core::error::ToolError;
use prospector_core::tool::EXTRACT_PAGE;
use std::sync::Arc;
use tracing::debug;

pub struct PageDistiller {
    reader: Arc<dyn PageReader>,
    summarizer: Arc<dyn Summarizer>,
}

impl PageDistiller {
    pub fn new(reader: Arc<dyn PageReader>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { reader, summarizer }
    }
}

#[async_trait]
impl PageExtractor for PageDistiller {
    async fn extract(&self, url: &str, goal: &str) -> Result<String, ToolError> {
        let page = self.reader.read(url).await?;
        if page.trim().is_empty() {
            return Err(ToolError::ExecutionFailed {
                tool_name: EXTRACT_PAGE.into(),
                reason: format!("{url} returned no readable text"),
            });
        }

        let instruction = format!(
            "Extract from the following page text only the facts relevant to this goal: \
             {goal}. Quote concrete numbers, names, and limits exactly. If the page does \
             not address the goal, say so in one line."
        );
        debug!(url, goal, chars = page.len(), "Distilling page");

        self.summarizer
            .summarize(&instruction, &page)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: EXTRACT_PAGE.into(),
                reason: format!("distillation failed: {e}"),
            })
    }
}
