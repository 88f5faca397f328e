//! Tool gateway and collaborator adapters for Prospector.
//!
//! The gateway (`gateway::ToolGateway`) is the single invocation surface the
//! orchestration loop talks to. The adapters implement the collaborator
//! traits from `prospector-core` over real backends:
//!
//! - `serpapi` — precise search
//! - `brave` — broad discovery
//! - `reader` — fetch-only page retrieval
//! - `distill` — fetch-then-distill extraction
//! - `export` — file-based report sink
//!
//! `evaluate` is the odd one out: pure local computation, no backend.

pub mod brave;
pub mod distill;
pub mod evaluate;
pub mod export;
pub mod gateway;
pub mod reader;
pub mod serpapi;

pub use brave::BraveDiscovery;
pub use distill::PageDistiller;
pub use export::FileExporter;
pub use gateway::ToolGateway;
pub use reader::HttpPageReader;
pub use serpapi::SerpApiSearch;
