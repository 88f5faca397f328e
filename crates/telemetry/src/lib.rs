//! Token accounting and cost estimation for Prospector sessions.
//!
//! The cost estimate is a pure function of accumulated input/output token
//! counts and fixed per-token rates — nothing here talks to the network.

pub mod pricing;
pub mod usage;

pub use pricing::{ModelPricing, PricingTable};
pub use usage::UsageTotals;
