//! File-based export sink.
//!
//! Writes one JSON report per session into the reports directory. Idempotent:
//! re-exporting the same session rewrites the same named file. The caller
//! treats export as best-effort; a failure here never fails the session.

use async_trait::async_trait;
use prospector_core::collab::ExportSink;
use prospector_core::error::ExportError;
use prospector_core::session::{CostEstimate, Session};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

pub struct FileExporter {
    dir: PathBuf,
}

#[derive(Serialize)]
struct Report<'a> {
    session: &'a Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<&'a CostEstimate>,
}

impl FileExporter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn report_path(&self, session: &Session) -> PathBuf {
        self.dir.join(format!("research-{}.json", session.id))
    }
}

#[async_trait]
impl ExportSink for FileExporter {
    async fn export(
        &self,
        session: &Session,
        cost: Option<&CostEstimate>,
    ) -> Result<String, ExportError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ExportError::Sink(format!("cannot create report directory: {e}")))?;

        let path = self.report_path(session);
        let report = Report { session, cost };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| ExportError::Sink(format!("report encoding failed: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| ExportError::Sink(format!("report write failed: {e}")))?;

        debug!(path = %path.display(), "Session exported");
        Ok(path.display().to_string())
    }
}
