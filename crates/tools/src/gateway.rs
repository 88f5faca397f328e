//! The tool gateway — one uniform invocation surface over the five tools.
//!
//! Collaborator handles are injected at construction; an absent handle means
//! "not configured" and surfaces as a descriptive text result so the session
//! can continue with the remaining tools. Backend failures are folded into
//! the returned text for the same reason: absence of results is a valid
//! negotiation signal for the reasoning engine, not a session failure.

use prospector_core::collab::{DiscoveryProvider, PageExtractor, PageReader, SearchProvider};
use prospector_core::error::ToolError;
use prospector_core::session::SessionState;
use prospector_core::tool::ToolRequest;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::evaluate;

/// The gateway over all tool capabilities.
pub struct ToolGateway {
    search: Option<Arc<dyn SearchProvider>>,
    discovery: Option<Arc<dyn DiscoveryProvider>>,
    extractor: Option<Arc<dyn PageExtractor>>,
    reader: Option<Arc<dyn PageReader>>,
}

impl ToolGateway {
    pub fn new(
        search: Option<Arc<dyn SearchProvider>>,
        discovery: Option<Arc<dyn DiscoveryProvider>>,
        extractor: Option<Arc<dyn PageExtractor>>,
        reader: Option<Arc<dyn PageReader>>,
    ) -> Self {
        Self {
            search,
            discovery,
            extractor,
            reader,
        }
    }

    /// Execute one parsed tool request against the session state.
    ///
    /// Side effects stop at the accumulators in `state` — nothing is durable
    /// until the orchestration loop persists the session.
    pub async fn invoke(
        &self,
        request: &ToolRequest,
        state: &mut SessionState,
    ) -> Result<String, ToolError> {
        debug!(tool = request.name(), "Invoking tool");
        match request {
            ToolRequest::PreciseSearch { query } => {
                state.record_query(query);
                match &self.search {
                    None => Ok(not_configured("precise search")),
                    Some(search) => match search.search(query).await {
                        Ok(results) => Ok(results),
                        Err(e) => {
                            warn!(tool = request.name(), error = %e, "Search backend failed");
                            Ok(format!(
                                "Search failed: {e}. Treat this as zero results and try a \
                                 different query."
                            ))
                        }
                    },
                }
            }
            ToolRequest::BroadDiscover { query, context } => {
                state.record_discovery_query(query);
                match &self.discovery {
                    None => Ok(not_configured("broad discovery")),
                    Some(discovery) => match discovery.discover(query, context).await {
                        Ok(results) => Ok(results),
                        Err(e) => {
                            warn!(tool = request.name(), error = %e, "Discovery backend failed");
                            Ok(format!(
                                "Discovery failed: {e}. Treat this as zero results and try a \
                                 different angle."
                            ))
                        }
                    },
                }
            }
            ToolRequest::ExtractPage { url, goal } => match &self.extractor {
                None => Ok(not_configured("page extraction")),
                Some(extractor) => match extractor.extract(url, goal).await {
                    Ok(text) => Ok(text),
                    Err(e) => {
                        warn!(tool = request.name(), url = %url, error = %e, "Extraction failed");
                        Ok(format!("Could not extract {url}: {e}"))
                    }
                },
            },
            ToolRequest::ReadPage { url } => match &self.reader {
                None => Ok(not_configured("page reading")),
                Some(reader) => match reader.read(url).await {
                    Ok(text) => Ok(text),
                    Err(e) => {
                        warn!(tool = request.name(), url = %url, error = %e, "Page read failed");
                        Ok(format!("Could not read {url}: {e}"))
                    }
                },
            },
            ToolRequest::Evaluate(args) => {
                let record = args.clone().into_record();
                let report = evaluate::render_report(&record);
                state.record_candidate(record);
                Ok(report)
            }
        }
    }
}

fn not_configured(capability: &str) -> String {
    format!(
        "The {capability} backend is not configured (missing API key). Continue with the \
         other available tools."
    )
}
