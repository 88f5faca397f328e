//! ReasoningEngine trait — the abstraction over the model backend.
//!
//! The engine receives fixed instructions, the declared tool schemas, and the
//! conversation so far, and answers with either terminal text or one or more
//! tool invocation requests plus usage counts. The orchestration loop treats
//! it as an opaque capability.

use crate::error::EngineError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A request to the reasoning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Fixed instruction context (criteria checklist, memory context)
    pub instructions: String,

    /// The conversation turns
    pub messages: Vec<Message>,

    /// Tools the engine may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.3
}

/// A tool declaration sent to the engine so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResponse {
    /// The generated turn (text and/or tool calls)
    pub message: Message,

    /// Token usage reported by the engine
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// Token usage counts for one engine call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The reasoning engine boundary.
///
/// The orchestration loop calls `complete()` without knowing which backend is
/// in use — deterministic tests inject scripted implementations.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// A human-readable name for this engine (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: EngineRequest) -> Result<EngineResponse, EngineError>;
}
