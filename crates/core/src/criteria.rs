//! Acceptance criteria — the contract a research session evaluates against.
//!
//! Hard criteria are binary and non-negotiable; soft criteria are weighted
//! and scored. Both sets are immutable once parsed for a session.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// A binary, non-negotiable acceptance condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardCriterion {
    /// Short identifier (e.g., "coverage", "price")
    pub field: String,

    /// Human-readable requirement
    pub description: String,
}

/// A weighted, scored acceptance condition contributing to ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftCriterion {
    /// Human-readable requirement
    pub description: String,

    /// Importance weight, 1 (nice to have) to 5 (near-essential)
    pub weight: u8,
}

impl SoftCriterion {
    /// Create a soft criterion, clamping the weight into 1..=5.
    pub fn new(description: impl Into<String>, weight: u8) -> Self {
        Self {
            description: description.into(),
            weight: weight.clamp(1, 5),
        }
    }
}

/// Where a criteria set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaOrigin {
    /// Parsed from the user's request
    Parsed,
    /// Generic placeholder used because parsing failed — observable, not
    /// a hidden catch-all
    Fallback,
}

/// The full criteria set for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaSet {
    pub hard: Vec<HardCriterion>,
    pub soft: Vec<SoftCriterion>,
}

impl CriteriaSet {
    /// Enforce the session invariant: both sequences non-empty.
    ///
    /// Called at the parse boundary; the orchestration loop may assume a
    /// validated set.
    pub fn validate(&self) -> Result<(), Error> {
        if self.hard.is_empty() {
            return Err(Error::InvalidCriteria(
                "at least one hard criterion is required".into(),
            ));
        }
        if self.soft.is_empty() {
            return Err(Error::InvalidCriteria(
                "at least one soft criterion is required".into(),
            ));
        }
        if let Some(bad) = self.soft.iter().find(|s| !(1..=5).contains(&s.weight)) {
            return Err(Error::InvalidCriteria(format!(
                "soft criterion weight out of range 1..=5: {}",
                bad.weight
            )));
        }
        Ok(())
    }

    /// Generic placeholder criteria for the explicit parse-failure fallback.
    pub fn fallback() -> Self {
        Self {
            hard: vec![HardCriterion {
                field: "fit".into(),
                description: "Candidate satisfies the stated requirement".into(),
            }],
            soft: vec![SoftCriterion::new(
                "Overall quality and reliability of the candidate",
                3,
            )],
        }
    }

    /// Render the checklist block embedded in the loop's fixed instructions.
    pub fn render_checklist(&self) -> String {
        let mut out = String::from("Hard criteria (all must pass):\n");
        for (i, h) in self.hard.iter().enumerate() {
            out.push_str(&format!("{}. [{}] {}\n", i + 1, h.field, h.description));
        }
        out.push_str("\nSoft criteria (scored 0-10, weighted):\n");
        for (i, s) in self.soft.iter().enumerate() {
            out.push_str(&format!(
                "{}. (weight {}) {}\n",
                i + 1,
                s.weight,
                s.description
            ));
        }
        out
    }
}
