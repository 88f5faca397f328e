//! Built-in pricing table for the models a research session may run on.
//!
//! Prices are in USD per 1 million tokens. Custom pricing can be layered on
//! at runtime from TOML config overrides.

use crate::usage::UsageTotals;
use prospector_core::session::CostEstimate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Compute cost for the given token counts. Pure: doubling the counts
    /// doubles the result.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_m + output_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }
}

/// Pricing table with built-in defaults and custom overrides.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        prices.insert(
            "claude-sonnet-4-20250514".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "claude-opus-4-20250514".into(),
            ModelPricing::new(15.0, 75.0),
        );
        prices.insert(
            "claude-3-5-sonnet-20241022".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "claude-3-5-haiku-20241022".into(),
            ModelPricing::new(0.8, 4.0),
        );

        Self { prices }
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Add or update pricing for a model.
    pub fn set(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.prices.insert(model.into(), pricing);
    }

    /// Look up pricing for a model.
    ///
    /// Tries exact match first, then prefix match — a model response often
    /// carries a version suffix (`claude-sonnet-4-20250514-v2` should still
    /// match `claude-sonnet-4-20250514`).
    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        if let Some(p) = self.prices.get(model) {
            return Some(p);
        }
        let model_lower = model.to_lowercase();
        self.prices
            .iter()
            .filter(|(key, _)| model_lower.starts_with(&key.to_lowercase()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, p)| p)
    }

    /// Estimate the cost of a session from accumulated usage.
    ///
    /// Unknown models produce a zero-dollar estimate rather than an error —
    /// the token counts are still worth reporting.
    pub fn estimate(&self, model: &str, totals: &UsageTotals) -> CostEstimate {
        let usd = self
            .get(model)
            .map(|p| p.cost(totals.input_tokens, totals.output_tokens))
            .unwrap_or(0.0);
        CostEstimate {
            model: model.to_string(),
            input_tokens: totals.input_tokens,
            output_tokens: totals.output_tokens,
            usd,
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
