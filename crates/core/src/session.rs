//! Session domain types — candidates, the persisted session record, and the
//! per-run accumulator state.
//!
//! `SessionState` is an explicit value owned by the orchestration loop and
//! threaded through the tool gateway; nothing here is process-wide, so
//! concurrent sessions cannot interfere with each other's accumulators.

use crate::criteria::CriteriaSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of evaluating a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    NeedsMoreInfo,
}

impl Verdict {
    /// Parse the wire form used in tool arguments.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "needs_more_info" => Some(Self::NeedsMoreInfo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::NeedsMoreInfo => "needs_more_info",
        };
        write!(f, "{s}")
    }
}

/// Result of checking one hard criterion against a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardCheck {
    /// The criterion being checked (field or description)
    pub criterion: String,
    pub passed: bool,
    /// Evidence supporting the outcome
    pub evidence: String,
}

/// Score for one soft criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftScore {
    pub criterion: String,
    /// 0 (absent) to 10 (excellent)
    pub score: u8,
    pub reasoning: String,
}

/// A concrete option evaluated against the criteria set.
///
/// Created exactly once per `evaluate` tool invocation and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub verdict: Verdict,
    pub hard_checks: Vec<HardCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub soft_scores: Vec<SoftScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CandidateRecord {
    /// Mean soft score, if any soft criteria were scored.
    pub fn soft_average(&self) -> Option<f64> {
        if self.soft_scores.is_empty() {
            return None;
        }
        let sum: u32 = self.soft_scores.iter().map(|s| u32::from(s.score)).sum();
        Some(f64::from(sum) / self.soft_scores.len() as f64)
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The engine reached a finish intent
    Completed,
    /// The iteration cap was hit first
    Exhausted,
    /// Externally stopped mid-run; findings kept, record marked incomplete
    Cancelled,
}

/// One complete research run, persisted exactly once at termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub task: String,
    pub criteria: CriteriaSet,
    pub candidates: Vec<CandidateRecord>,
    /// Name of the first candidate with a pass verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<String>,
    pub search_queries: Vec<String>,
    pub conclusion: String,
    pub status: SessionStatus,
}

impl Session {
    /// Assemble the session record from the run's accumulated state.
    pub fn assemble(
        task: impl Into<String>,
        criteria: CriteriaSet,
        state: SessionState,
        conclusion: impl Into<String>,
        status: SessionStatus,
    ) -> Self {
        let best_match = state
            .candidates
            .iter()
            .find(|c| c.verdict == Verdict::Pass)
            .map(|c| c.name.clone());
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            task: task.into(),
            criteria,
            candidates: state.candidates,
            best_match,
            search_queries: state.search_queries,
            conclusion: conclusion.into(),
            status,
        }
    }
}

/// Session-scoped accumulators, reset per run.
///
/// Exclusively owned by the loop that created it until the session is
/// persisted; the gateway receives it as `&mut` so the sequential tool
/// discipline is explicit in the signature.
#[derive(Debug, Default)]
pub struct SessionState {
    pub candidates: Vec<CandidateRecord>,
    pub search_queries: Vec<String>,
}

impl SessionState {
    /// Record a precise-search query.
    pub fn record_query(&mut self, query: &str) {
        self.search_queries.push(query.to_string());
    }

    /// Record a broad-discovery query, tagged so it is distinguishable
    /// from precise-search queries in the log.
    pub fn record_discovery_query(&mut self, query: &str) {
        self.search_queries.push(format!("[discover] {query}"));
    }

    /// Append an immutable candidate record.
    pub fn record_candidate(&mut self, candidate: CandidateRecord) {
        self.candidates.push(candidate);
    }

    /// Whether any observable work happened in this session.
    pub fn has_work(&self) -> bool {
        !self.candidates.is_empty() || !self.search_queries.is_empty()
    }
}

/// Estimated monetary cost of a session, a pure function of accumulated
/// token counts and fixed per-token rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub usd: f64,
}
