//! # Prospector Core
//!
//! Domain types, traits, and error definitions for the Prospector research
//! agent. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Deterministic loop tests with scripted mock collaborators
//! - Swapping backends via configuration
//! - A clean dependency graph (all crates depend inward on core)

pub mod collab;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod message;
pub mod session;
pub mod text;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use collab::{
    DiscoveryProvider, ExportSink, PageExtractor, PageReader, SearchProvider, Summarizer,
};
pub use criteria::{CriteriaOrigin, CriteriaSet, HardCriterion, SoftCriterion};
pub use engine::{EngineRequest, EngineResponse, ReasoningEngine, ToolDefinition, Usage};
pub use error::{EngineError, Error, ExportError, MemoryError, Result, ToolError};
pub use message::{Message, Role, ToolCall};
pub use session::{
    CandidateRecord, CostEstimate, HardCheck, Session, SessionState, SessionStatus, SoftScore,
    Verdict,
};
pub use tool::{EvaluateArgs, ToolRequest};
