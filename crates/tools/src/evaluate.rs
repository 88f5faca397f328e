//! Deterministic rendering of a candidate evaluation.
//!
//! The report is what the reasoning engine reads back after calling
//! `evaluate`, so it restates the recorded facts verbatim: hard pass/fail
//! table, soft-score average, verdict line.

use prospector_core::session::{CandidateRecord, Verdict};

/// Render the human-readable evaluation report for a recorded candidate.
pub fn render_report(record: &CandidateRecord) -> String {
    let mut out = format!("Evaluation recorded: {}\n", record.name);
    if let Some(url) = &record.url {
        out.push_str(&format!("URL: {url}\n"));
    }

    out.push_str("Hard criteria:\n");
    for check in &record.hard_checks {
        let mark = if check.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("  [{mark}] {}", check.criterion));
        if !check.evidence.is_empty() {
            out.push_str(&format!(" — {}", check.evidence));
        }
        out.push('\n');
    }

    if !record.soft_scores.is_empty() {
        let avg = record.soft_average().unwrap_or(0.0);
        out.push_str(&format!("Soft scores (average {avg:.1}/10):\n"));
        for score in &record.soft_scores {
            out.push_str(&format!("  {}: {}/10", score.criterion, score.score));
            if !score.reasoning.is_empty() {
                out.push_str(&format!(" — {}", score.reasoning));
            }
            out.push('\n');
        }
    }

    let verdict = match record.verdict {
        Verdict::Pass => "PASS",
        Verdict::Fail => "FAIL",
        Verdict::NeedsMoreInfo => "NEEDS MORE INFO",
    };
    out.push_str(&format!("Verdict: {verdict}\n"));

    if let Some(reason) = &record.rejection_reason {
        out.push_str(&format!("Rejection reason: {reason}\n"));
    }
    if let Some(notes) = &record.notes {
        out.push_str(&format!("Notes: {notes}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_core::session::{HardCheck, SoftScore};

    fn record() -> CandidateRecord {
        CandidateRecord {
            name: "Acme SMS".into(),
            url: Some("https://acme.example".into()),
            verdict: Verdict::Fail,
            hard_checks: vec![
                HardCheck {
                    criterion: "coverage".into(),
                    passed: true,
                    evidence: "direct routes listed".into(),
                },
                HardCheck {
                    criterion: "price".into(),
                    passed: false,
                    evidence: "$0.09/SMS".into(),
                },
            ],
            soft_scores: vec![
                SoftScore {
                    criterion: "support".into(),
                    score: 8,
                    reasoning: "24/7 chat".into(),
                },
                SoftScore {
                    criterion: "docs".into(),
                    score: 5,
                    reasoning: String::new(),
                },
            ],
            rejection_reason: Some("price above the $0.05 ceiling".into()),
            notes: None,
        }
    }

    #[test]
    fn report_contains_every_fact() {
        let report = render_report(&record());
        assert!(report.contains("Acme SMS"));
        assert!(report.contains("https://acme.example"));
        assert!(report.contains("[PASS] coverage — direct routes listed"));
        assert!(report.contains("[FAIL] price — $0.09/SMS"));
        assert!(report.contains("average 6.5/10"));
        assert!(report.contains("support: 8/10 — 24/7 chat"));
        assert!(report.contains("Verdict: FAIL"));
        assert!(report.contains("price above the $0.05 ceiling"));
    }

    #[test]
    fn report_is_deterministic() {
        let r = record();
        assert_eq!(render_report(&r), render_report(&r));
    }

    #[test]
    fn minimal_record_renders() {
        let r = CandidateRecord {
            name: "Bare".into(),
            url: None,
            verdict: Verdict::NeedsMoreInfo,
            hard_checks: vec![HardCheck {
                criterion: "fit".into(),
                passed: false,
                evidence: String::new(),
            }],
            soft_scores: vec![],
            rejection_reason: None,
            notes: None,
        };
        let report = render_report(&r);
        assert!(report.contains("NEEDS MORE INFO"));
        assert!(!report.contains("Soft scores"));
        assert!(!report.contains("URL:"));
    }
}
