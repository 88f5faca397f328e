//! The closed tool vocabulary.
//!
//! The engine addresses tools by name with JSON arguments; the gateway
//! boundary parses every call into [`ToolRequest`] exactly once, so dispatch
//! is exhaustively checked at compile time and malformed calls are rejected
//! before any collaborator is touched.

use crate::engine::ToolDefinition;
use crate::error::ToolError;
use crate::session::{CandidateRecord, HardCheck, SoftScore, Verdict};
use serde::Deserialize;
use serde_json::Value;

pub const PRECISE_SEARCH: &str = "precise_search";
pub const BROAD_DISCOVER: &str = "broad_discover";
pub const EXTRACT_PAGE: &str = "extract_page";
pub const READ_PAGE: &str = "read_page";
pub const EVALUATE: &str = "evaluate";

/// A parsed, validated tool invocation.
#[derive(Debug, Clone)]
pub enum ToolRequest {
    /// Targeted web search for a specific query
    PreciseSearch { query: String },
    /// Wide-net discovery of candidates, with task context
    BroadDiscover { query: String, context: String },
    /// Fetch a page and distill it against an extraction goal
    ExtractPage { url: String, goal: String },
    /// Fetch a page verbatim (capped) for nuance the distiller would lose
    ReadPage { url: String },
    /// Record a candidate evaluation — pure local operation
    Evaluate(EvaluateArgs),
}

/// Arguments for the `evaluate` tool.
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    pub name: String,
    pub url: Option<String>,
    pub hard_criteria: Vec<HardCheck>,
    pub soft_criteria: Vec<SoftScore>,
    pub verdict: Verdict,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

impl EvaluateArgs {
    /// Consume the arguments into an immutable candidate record.
    pub fn into_record(self) -> CandidateRecord {
        CandidateRecord {
            name: self.name,
            url: self.url,
            verdict: self.verdict,
            hard_checks: self.hard_criteria,
            soft_scores: self.soft_criteria,
            rejection_reason: self.rejection_reason,
            notes: self.notes,
        }
    }
}

// Wire shapes for evaluate arguments. Scores are clamped, not rejected:
// an out-of-range score from the engine is still a usable signal.
#[derive(Deserialize)]
struct HardCheckWire {
    criterion: String,
    passed: bool,
    #[serde(default)]
    evidence: String,
}

#[derive(Deserialize)]
struct SoftScoreWire {
    criterion: String,
    score: u8,
    #[serde(default)]
    reasoning: String,
}

impl ToolRequest {
    /// The wire name of this request.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreciseSearch { .. } => PRECISE_SEARCH,
            Self::BroadDiscover { .. } => BROAD_DISCOVER,
            Self::ExtractPage { .. } => EXTRACT_PAGE,
            Self::ReadPage { .. } => READ_PAGE,
            Self::Evaluate(_) => EVALUATE,
        }
    }

    /// Parse an engine tool call into the closed vocabulary.
    pub fn parse(name: &str, args: &Value) -> Result<Self, ToolError> {
        match name {
            PRECISE_SEARCH => Ok(Self::PreciseSearch {
                query: required_str(name, args, "query")?,
            }),
            BROAD_DISCOVER => Ok(Self::BroadDiscover {
                query: required_str(name, args, "query")?,
                context: optional_str(args, "context").unwrap_or_default(),
            }),
            EXTRACT_PAGE => Ok(Self::ExtractPage {
                url: required_str(name, args, "url")?,
                goal: required_str(name, args, "extraction_goal")?,
            }),
            READ_PAGE => Ok(Self::ReadPage {
                url: required_str(name, args, "url")?,
            }),
            EVALUATE => Ok(Self::Evaluate(parse_evaluate(args)?)),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// The five tool declarations sent to the engine.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: PRECISE_SEARCH.into(),
                description: "Search the web for a specific, targeted query. Returns result \
                              titles, snippets, and source URLs."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "The search query" }
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: BROAD_DISCOVER.into(),
                description: "Cast a wide net to discover candidate services or products. Use \
                              when you need options rather than a specific fact."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "What kind of candidates to discover" },
                        "context": { "type": "string", "description": "Task context that sharpens the discovery" }
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: EXTRACT_PAGE.into(),
                description: "Fetch a web page and distill the facts relevant to a stated goal. \
                              Prefer this over read_page for long pages."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "url": { "type": "string", "description": "The page URL" },
                        "extraction_goal": { "type": "string", "description": "What to extract (e.g. pricing for Argentina routes)" }
                    },
                    "required": ["url", "extraction_goal"]
                }),
            },
            ToolDefinition {
                name: READ_PAGE.into(),
                description: "Fetch a web page verbatim (truncated). Use when exact wording \
                              matters more than a distilled summary."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "url": { "type": "string", "description": "The page URL" }
                    },
                    "required": ["url"]
                }),
            },
            ToolDefinition {
                name: EVALUATE.into(),
                description: "Record a candidate's evaluation against the criteria checklist. \
                              Call exactly once per candidate once enough evidence is gathered."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Candidate name" },
                        "url": { "type": "string", "description": "Candidate website" },
                        "hard_criteria": {
                            "type": "array",
                            "description": "One entry per hard criterion",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "criterion": { "type": "string" },
                                    "passed": { "type": "boolean" },
                                    "evidence": { "type": "string" }
                                },
                                "required": ["criterion", "passed"]
                            }
                        },
                        "soft_criteria": {
                            "type": "array",
                            "description": "One entry per soft criterion",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "criterion": { "type": "string" },
                                    "score": { "type": "integer", "minimum": 0, "maximum": 10 },
                                    "reasoning": { "type": "string" }
                                },
                                "required": ["criterion", "score"]
                            }
                        },
                        "verdict": {
                            "type": "string",
                            "enum": ["pass", "fail", "needs_more_info"]
                        },
                        "rejection_reason": { "type": "string" },
                        "notes": { "type": "string" }
                    },
                    "required": ["name", "hard_criteria", "verdict"]
                }),
            },
        ]
    }
}

fn required_str(tool: &str, args: &Value, field: &str) -> Result<String, ToolError> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool_name: tool.to_string(),
            reason: format!("missing required field '{field}'"),
        })
}

fn optional_str(args: &Value, field: &str) -> Option<String> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_evaluate(args: &Value) -> Result<EvaluateArgs, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool_name: EVALUATE.to_string(),
        reason,
    };

    let name = required_str(EVALUATE, args, "name")?;

    let hard_wire: Vec<HardCheckWire> = args
        .get("hard_criteria")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| invalid(format!("malformed hard_criteria: {e}")))?
        .unwrap_or_default();
    if hard_wire.is_empty() {
        return Err(invalid("hard_criteria must contain at least one entry".into()));
    }

    let soft_wire: Vec<SoftScoreWire> = args
        .get("soft_criteria")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| invalid(format!("malformed soft_criteria: {e}")))?
        .unwrap_or_default();

    let verdict_raw = required_str(EVALUATE, args, "verdict")?;
    let verdict = Verdict::parse(&verdict_raw)
        .ok_or_else(|| invalid(format!("unknown verdict '{verdict_raw}'")))?;

    Ok(EvaluateArgs {
        name,
        url: optional_str(args, "url"),
        hard_criteria: hard_wire
            .into_iter()
            .map(|w| HardCheck {
                criterion: w.criterion,
                passed: w.passed,
                evidence: w.evidence,
            })
            .collect(),
        soft_criteria: soft_wire
            .into_iter()
            .map(|w| SoftScore {
                criterion: w.criterion,
                score: w.score.min(10),
                reasoning: w.reasoning,
            })
            .collect(),
        verdict,
        rejection_reason: optional_str(args, "rejection_reason"),
        notes: optional_str(args, "notes"),
    })
}
