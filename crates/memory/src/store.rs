//! The on-disk memory document.
//!
//! One JSON document holds everything: the bounded session history and the
//! accumulated per-service fact map. Reads load the whole document, writes
//! rewrite it in full — single-writer semantics, no partial updates.

use chrono::{DateTime, Utc};
use prospector_core::session::{CandidateRecord, Session, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most-recent sessions kept; the oldest is evicted first.
pub const SESSION_CAP: usize = 50;

/// Most-recent free-text notes kept per known service.
pub const NOTE_CAP: usize = 10;

/// The full durable store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub sessions: Vec<Session>,

    /// Keyed by normalized candidate name.
    #[serde(default)]
    pub known_services: BTreeMap<String, KnownService>,
}

/// Cross-session accumulated facts about a previously evaluated candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub last_checked: DateTime<Utc>,

    /// Most recent verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,

    /// Fact key → fact text; re-evaluation updates in place
    #[serde(default)]
    pub facts: BTreeMap<String, String>,

    /// Free-text notes, most recent last
    #[serde(default)]
    pub notes: Vec<String>,
}

impl KnownService {
    fn new(checked: DateTime<Utc>) -> Self {
        Self {
            url: None,
            last_checked: checked,
            verdict: None,
            facts: BTreeMap::new(),
            notes: Vec::new(),
        }
    }
}

/// Normalize a candidate name into a stable service key.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl MemoryStore {
    /// Append a session, evicting the oldest beyond [`SESSION_CAP`], and fold
    /// every candidate into the known-service map.
    pub fn absorb(&mut self, session: &Session) {
        for candidate in &session.candidates {
            self.absorb_candidate(candidate, session.timestamp);
        }
        self.sessions.push(session.clone());
        while self.sessions.len() > SESSION_CAP {
            self.sessions.remove(0);
        }
    }

    /// Upsert a known-service entry from one candidate evaluation.
    ///
    /// Facts are keyed, so re-evaluating the same candidate updates rather
    /// than duplicates; notes append with the oldest dropped past the cap.
    fn absorb_candidate(&mut self, candidate: &CandidateRecord, checked: DateTime<Utc>) {
        let key = normalize_name(&candidate.name);
        if key.is_empty() {
            return;
        }
        let entry = self
            .known_services
            .entry(key)
            .or_insert_with(|| KnownService::new(checked));

        if candidate.url.is_some() {
            entry.url = candidate.url.clone();
        }
        entry.verdict = Some(candidate.verdict);
        entry.last_checked = checked;

        for check in &candidate.hard_checks {
            let outcome = if check.passed { "pass" } else { "fail" };
            entry.facts.insert(
                format!("hard:{}", check.criterion),
                format!("{outcome} — {}", check.evidence),
            );
        }
        for score in &candidate.soft_scores {
            entry.facts.insert(
                format!("soft:{}", score.criterion),
                format!("{}/10 — {}", score.score, score.reasoning),
            );
        }
        if let Some(reason) = &candidate.rejection_reason {
            entry.notes.push(format!("rejected: {reason}"));
        }
        if let Some(note) = &candidate.notes {
            entry.notes.push(note.clone());
        }
        if entry.notes.len() > NOTE_CAP {
            let excess = entry.notes.len() - NOTE_CAP;
            entry.notes.drain(..excess);
        }
    }
}
