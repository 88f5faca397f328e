//! Natural-language criteria parsing — a single-shot engine call.
//!
//! The engine is asked to restate the task as a JSON criteria object. Any
//! failure (engine error, malformed JSON, empty lists) falls back to a
//! generic criteria set — but observably: the returned origin is
//! [`CriteriaOrigin::Fallback`] and the failure is logged, never a hidden
//! catch-all.

use prospector_core::criteria::{CriteriaOrigin, CriteriaSet, HardCriterion, SoftCriterion};
use prospector_core::engine::{EngineRequest, ReasoningEngine};
use prospector_core::error::Error;
use prospector_core::message::Message;
use serde::Deserialize;
use tracing::{debug, warn};

const PARSE_INSTRUCTIONS: &str = "Extract research acceptance criteria from the user's task. \
     Respond with only a JSON object of the form \
     {\"hard\": [{\"field\": \"short_id\", \"description\": \"...\"}], \
      \"soft\": [{\"description\": \"...\", \"weight\": 1-5}]}. \
     Hard criteria are binary, non-negotiable requirements; soft criteria are weighted \
     preferences. Derive at least one of each.";

#[derive(Deserialize)]
struct CriteriaWire {
    #[serde(default)]
    hard: Vec<HardCriterion>,
    #[serde(default)]
    soft: Vec<SoftWire>,
}

#[derive(Deserialize)]
struct SoftWire {
    description: String,
    #[serde(default = "default_weight")]
    weight: u8,
}

fn default_weight() -> u8 {
    3
}

/// Parse criteria from the task text, falling back explicitly on failure.
pub async fn parse_criteria(
    engine: &dyn ReasoningEngine,
    model: &str,
    task: &str,
) -> (CriteriaSet, CriteriaOrigin) {
    match try_parse(engine, model, task).await {
        Ok(set) => {
            debug!(
                hard = set.hard.len(),
                soft = set.soft.len(),
                "Criteria parsed from task"
            );
            (set, CriteriaOrigin::Parsed)
        }
        Err(e) => {
            warn!(error = %e, "Criteria parsing failed, using generic fallback criteria");
            (CriteriaSet::fallback(), CriteriaOrigin::Fallback)
        }
    }
}

async fn try_parse(
    engine: &dyn ReasoningEngine,
    model: &str,
    task: &str,
) -> Result<CriteriaSet, Error> {
    let request = EngineRequest {
        model: model.to_string(),
        instructions: PARSE_INSTRUCTIONS.to_string(),
        messages: vec![Message::user(task)],
        tools: vec![],
        max_tokens: 1024,
        temperature: 0.0,
    };
    let response = engine.complete(request).await?;

    let json = extract_json_object(&response.message.content)
        .ok_or_else(|| Error::Internal("no JSON object in criteria response".into()))?;
    let wire: CriteriaWire = serde_json::from_str(json)?;

    let set = CriteriaSet {
        hard: wire.hard,
        soft: wire
            .soft
            .into_iter()
            .map(|s| SoftCriterion::new(s.description, s.weight))
            .collect(),
    };
    set.validate()?;
    Ok(set)
}

/// Slice out the outermost JSON object, tolerating prose or code fences
/// around it.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
