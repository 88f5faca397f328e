//! Durable cross-session memory for Prospector.
//!
//! A single JSON document on disk records past sessions and accumulated
//! per-service facts. Reads load the document fresh; writes rewrite it in
//! full. A corrupt or unreadable document degrades to an empty store — stale
//! memory is less harmful than a researcher with no memory at all.
//!
//! Concurrent writers are NOT protected against: the last full-file rewrite
//! wins. Acceptable at expected low concurrency; a real multi-writer
//! deployment needs a lock or compare-and-swap protocol here.

pub mod keywords;
pub mod store;

pub use store::{KnownService, MemoryStore, NOTE_CAP, SESSION_CAP, normalize_name};

use chrono::{DateTime, Utc};
use prospector_core::error::MemoryError;
use prospector_core::session::Session;
use prospector_core::text::truncate;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Sentinel returned when the store holds no sessions at all.
pub const EMPTY_STORE_CONTEXT: &str = "No prior research on record.";

/// Sentinel returned when the store has sessions but none are relevant.
/// Distinct from [`EMPTY_STORE_CONTEXT`] for caller-side conditional logic.
pub const NO_RELEVANT_CONTEXT: &str = "No prior research relevant to this task.";

/// Character bound on the rendered context block.
const CONTEXT_CHAR_CAP: usize = 2400;

/// Handle to the durable memory document.
#[derive(Debug, Clone)]
pub struct ResearchMemory {
    path: PathBuf,
}

/// Aggregate counters for the `stats` command.
#[derive(Debug, Clone)]
pub struct MemoryStats {
    pub sessions: usize,
    pub services: usize,
    pub last_research: Option<DateTime<Utc>>,
}

impl ResearchMemory {
    /// Create a handle for the document at `path`. Nothing is read until the
    /// first operation.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the store fresh from disk. Missing file → empty store; corrupt
    /// file → empty store with a warning.
    pub fn load(&self) -> MemoryStore {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return MemoryStore::default(),
        };
        match serde_json::from_str(&content) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e,
                      "Memory document unreadable, starting from an empty store");
                MemoryStore::default()
            }
        }
    }

    /// Rewrite the full document.
    fn persist(&self, store: &MemoryStore) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("failed to create memory directory: {e}"))
            })?;
        }
        let content = serde_json::to_string_pretty(store)
            .map_err(|e| MemoryError::Encoding(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| MemoryError::Storage(format!("failed to write memory document: {e}")))?;
        Ok(())
    }

    /// Render past-research context relevant to `task`.
    ///
    /// Scores each stored session by keyword overlap against its task +
    /// conclusion, keeps the top `max_sessions` with a positive score (ties
    /// broken by original order), and appends known-service entries whose own
    /// keyword set intersects the task's.
    pub fn recall(&self, task: &str, max_sessions: usize) -> String {
        let store = self.load();
        if store.sessions.is_empty() && store.known_services.is_empty() {
            return EMPTY_STORE_CONTEXT.to_string();
        }

        let task_keywords = keywords::extract(task);

        let mut scored: Vec<(usize, &Session)> = store
            .sessions
            .iter()
            .filter_map(|s| {
                let text = format!("{} {}", s.task, s.conclusion);
                let score = keywords::overlap(&task_keywords, &keywords::extract(&text));
                (score > 0).then_some((score, s))
            })
            .collect();
        // stable sort keeps original order on ties
        scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));
        scored.truncate(max_sessions);

        let relevant_services: Vec<(&String, &KnownService)> = store
            .known_services
            .iter()
            .filter(|(name, svc)| {
                let mut text = (*name).clone();
                for fact in svc.facts.values() {
                    text.push(' ');
                    text.push_str(fact);
                }
                for note in &svc.notes {
                    text.push(' ');
                    text.push_str(note);
                }
                keywords::overlap(&task_keywords, &keywords::extract(&text)) > 0
            })
            .collect();

        if scored.is_empty() && relevant_services.is_empty() {
            return NO_RELEVANT_CONTEXT.to_string();
        }

        let mut out = String::new();
        if !scored.is_empty() {
            out.push_str("Previous research sessions:\n");
            for (_, session) in &scored {
                out.push_str(&format!(
                    "- [{}] {} — {}",
                    session.timestamp.format("%Y-%m-%d"),
                    truncate(&session.task, 120),
                    truncate(&session.conclusion, 200),
                ));
                if let Some(best) = &session.best_match {
                    out.push_str(&format!(" (best match: {best})"));
                }
                out.push('\n');
            }
        }
        if !relevant_services.is_empty() {
            out.push_str("\nKnown services:\n");
            for (name, svc) in &relevant_services {
                let verdict = svc
                    .verdict
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "unknown".into());
                out.push_str(&format!(
                    "- {name} (last checked {}, verdict: {verdict})",
                    svc.last_checked.format("%Y-%m-%d"),
                ));
                for (key, fact) in svc.facts.iter().take(4) {
                    out.push_str(&format!("\n    {key}: {}", truncate(fact, 140)));
                }
                if let Some(note) = svc.notes.last() {
                    out.push_str(&format!("\n    note: {}", truncate(note, 140)));
                }
                out.push('\n');
            }
        }

        debug!(
            sessions = scored.len(),
            services = relevant_services.len(),
            "Recalled memory context"
        );
        truncate(&out, CONTEXT_CHAR_CAP)
    }

    /// Append a finished session and upsert known-service entries, then
    /// rewrite the document.
    pub fn save_session(&self, session: &Session) -> Result<(), MemoryError> {
        let mut store = self.load();
        store.absorb(session);
        self.persist(&store)?;
        debug!(session_id = %session.id, sessions = store.sessions.len(), "Session persisted");
        Ok(())
    }

    /// Aggregate statistics over the stored document.
    pub fn stats(&self) -> MemoryStats {
        let store = self.load();
        let last_research = store.sessions.iter().map(|s| s.timestamp).max();
        MemoryStats {
            sessions: store.sessions.len(),
            services: store.known_services.len(),
            last_research,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_core::criteria::{CriteriaSet, HardCriterion, SoftCriterion};
    use prospector_core::session::{
        CandidateRecord, HardCheck, SessionState, SessionStatus, Verdict,
    };

    fn criteria() -> CriteriaSet {
        CriteriaSet {
            hard: vec![HardCriterion {
                field: "coverage".into(),
                description: "Argentina".into(),
            }],
            soft: vec![SoftCriterion::new("support", 3)],
        }
    }

    fn memory() -> (ResearchMemory, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (ResearchMemory::new(dir.path().join("memory.json")), dir)
    }

    fn session(task: &str, conclusion: &str) -> Session {
        let mut s = Session::assemble(
            task,
            criteria(),
            SessionState::default(),
            conclusion,
            SessionStatus::Completed,
        );
        s.conclusion = conclusion.into();
        s
    }

    fn session_with_candidate(task: &str, name: &str) -> Session {
        let mut state = SessionState::default();
        state.record_candidate(CandidateRecord {
            name: name.into(),
            url: None,
            verdict: Verdict::Pass,
            hard_checks: vec![HardCheck {
                criterion: "coverage".into(),
                passed: true,
                evidence: "argentina routes confirmed".into(),
            }],
            soft_scores: vec![],
            rejection_reason: None,
            notes: None,
        });
        Session::assemble(task, criteria(), state, "done", SessionStatus::Completed)
    }

    #[test]
    fn empty_store_sentinel() {
        let (mem, _dir) = memory();
        assert_eq!(mem.recall("anything at all here", 5), EMPTY_STORE_CONTEXT);
    }

    #[test]
    fn irrelevant_store_sentinel_differs() {
        let (mem, _dir) = memory();
        mem.save_session(&session(
            "kubernetes hosting comparison",
            "picked a managed cluster vendor",
        ))
        .unwrap();
        let ctx = mem.recall("chocolate cake recipes", 5);
        assert_eq!(ctx, NO_RELEVANT_CONTEXT);
        assert_ne!(ctx, EMPTY_STORE_CONTEXT);
    }

    #[test]
    fn relevant_session_recalled() {
        let (mem, _dir) = memory();
        mem.save_session(&session(
            "sms provider argentina routes",
            "Acme looked strongest",
        ))
        .unwrap();
        mem.save_session(&session("email marketing platforms", "picked one"))
            .unwrap();

        let ctx = mem.recall("cheap sms routes argentina", 5);
        assert!(ctx.contains("argentina"));
        assert!(!ctx.contains("email marketing"));
    }

    #[test]
    fn relevance_ranking_is_monotonic() {
        let (mem, _dir) = memory();
        mem.save_session(&session("argentina travel visas", "summary"))
            .unwrap();
        // shares strictly more keywords with the query
        mem.save_session(&session(
            "argentina sms provider pricing routes",
            "summary",
        ))
        .unwrap();

        let ctx = mem.recall("argentina sms routes pricing", 5);
        let strong = ctx.find("argentina sms provider pricing routes").unwrap();
        let weak = ctx.find("argentina travel visas").unwrap_or(usize::MAX);
        assert!(strong < weak, "higher-overlap session must rank first");
    }

    #[test]
    fn known_service_surfaces_by_keyword() {
        let (mem, _dir) = memory();
        mem.save_session(&session_with_candidate(
            "bulk messaging research",
            "Acme SMS",
        ))
        .unwrap();

        let ctx = mem.recall("argentina routes pricing", 5);
        assert!(ctx.contains("acme sms"));
        assert!(ctx.contains("hard:coverage"));
    }

    #[test]
    fn corrupt_document_degrades_to_empty() {
        let (mem, dir) = memory();
        std::fs::write(dir.path().join("memory.json"), "{ not json at all").unwrap();
        assert_eq!(mem.recall("whatever task text", 5), EMPTY_STORE_CONTEXT);
        let stats = mem.stats();
        assert_eq!(stats.sessions, 0);
    }

    #[test]
    fn save_then_reload_roundtrip() {
        let (mem, _dir) = memory();
        mem.save_session(&session_with_candidate("task one here", "Acme SMS"))
            .unwrap();

        // a second handle at the same path sees the data
        let mem2 = ResearchMemory::new(mem.path.clone());
        let store = mem2.load();
        assert_eq!(store.sessions.len(), 1);
        assert!(store.known_services.contains_key("acme sms"));
    }

    #[test]
    fn eviction_after_fifty_one_sessions() {
        let (mem, _dir) = memory();
        for i in 0..=SESSION_CAP {
            mem.save_session(&session(&format!("distinct task {i}"), "conclusion"))
                .unwrap();
        }
        let store = mem.load();
        assert_eq!(store.sessions.len(), SESSION_CAP);
        assert_eq!(store.sessions[0].task, "distinct task 1");
    }

    #[test]
    fn stats_reflect_content() {
        let (mem, _dir) = memory();
        let stats = mem.stats();
        assert_eq!(stats.sessions, 0);
        assert!(stats.last_research.is_none());

        mem.save_session(&session_with_candidate("task", "Acme SMS"))
            .unwrap();
        let stats = mem.stats();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.services, 1);
        assert!(stats.last_research.is_some());
    }

    #[test]
    fn context_block_is_bounded() {
        let (mem, _dir) = memory();
        for i in 0..20 {
            mem.save_session(&session(
                &format!("argentina sms provider research round {i} with a very long task description repeated"),
                &"long conclusion text ".repeat(30),
            ))
            .unwrap();
        }
        let ctx = mem.recall("argentina sms provider", 5);
        assert!(ctx.chars().count() <= CONTEXT_CHAR_CAP + 1);
    }
}
