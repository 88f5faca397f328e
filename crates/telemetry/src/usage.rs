//! Running token totals for a single session.

use prospector_core::engine::Usage;
use serde::{Deserialize, Serialize};

/// Accumulated usage across all engine calls in one session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub engine_calls: u32,
}

impl UsageTotals {
    /// Fold one engine call's reported usage into the totals.
    pub fn record(&mut self, usage: &Usage) {
        self.input_tokens += u64::from(usage.input_tokens);
        self.output_tokens += u64::from(usage.output_tokens);
        self.engine_calls += 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
