//! Reasoning engine clients for Prospector.
//!
//! The orchestration loop only sees `prospector_core::ReasoningEngine`;
//! this crate supplies the real backends.

pub mod anthropic;
pub mod summarizer;

pub use anthropic::AnthropicEngine;
pub use summarizer::EngineSummarizer;
