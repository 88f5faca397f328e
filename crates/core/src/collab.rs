//! Collaborator traits — the seams to every external service.
//!
//! Each collaborator is an explicitly constructed, injected handle; nothing
//! is captured from process-wide state. This is what makes the orchestration
//! loop deterministic under test: every trait here has a scripted mock in the
//! agent crate's tests.

use crate::error::{EngineError, ExportError, ToolError};
use crate::session::{CostEstimate, Session};
use async_trait::async_trait;

/// Precise web search: a targeted query in, formatted result text out.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<String, ToolError>;
}

/// Broad candidate discovery: a wide query plus task context.
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn discover(&self, query: &str, context: &str) -> Result<String, ToolError>;
}

/// Fetch-only page retrieval. Implementations apply their own bounded
/// timeout and character cap.
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read(&self, url: &str) -> Result<String, ToolError>;
}

/// Fetch-then-distill page extraction against a stated goal.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, url: &str, goal: &str) -> Result<String, ToolError>;
}

/// Summarization collaborator. May fail; callers must treat failure as
/// "no compression", never as a session failure.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, instruction: &str, text: &str) -> Result<String, EngineError>;
}

/// Structured-export sink. Idempotent per session: repeated calls with the
/// same session reuse the same named destination. Always best-effort at the
/// call site.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export(
        &self,
        session: &Session,
        cost: Option<&CostEstimate>,
    ) -> Result<String, ExportError>;
}
