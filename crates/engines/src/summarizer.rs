//! Engine-backed summarization collaborator.
//!
//! One single-shot completion per call, no tools declared. Used by the
//! history compressor and the page distiller; both treat failure as a
//! degraded path, so errors pass through untouched.

use async_trait::async_trait;
use prospector_core::collab::Summarizer;
use prospector_core::engine::{EngineRequest, ReasoningEngine};
use prospector_core::error::EngineError;
use prospector_core::message::Message;
use std::sync::Arc;

const SUMMARY_MAX_TOKENS: u32 = 1024;

pub struct EngineSummarizer {
    engine: Arc<dyn ReasoningEngine>,
    model: String,
}

impl EngineSummarizer {
    pub fn new(engine: Arc<dyn ReasoningEngine>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for EngineSummarizer {
    async fn summarize(&self, instruction: &str, text: &str) -> Result<String, EngineError> {
        let request = EngineRequest {
            model: self.model.clone(),
            instructions: instruction.to_string(),
            messages: vec![Message::user(text)],
            tools: vec![],
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: 0.0,
        };
        let response = self.engine.complete(request).await?;
        Ok(response.message.content)
    }
}
