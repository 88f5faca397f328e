//! Anthropic native engine implementation.
//!
//! Uses Anthropic's Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//!
//! 429 responses map to `EngineError::RateLimited` carrying the server's
//! `retry-after` hint so the loop's backoff can honor it.

use async_trait::async_trait;
use prospector_core::engine::{
    EngineRequest, EngineResponse, ReasoningEngine, ToolDefinition, Usage,
};
use prospector_core::error::EngineError;
use prospector_core::message::{Message, Role, ToolCall};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Anthropic Messages API engine.
pub struct AnthropicEngine {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicEngine {
    /// Create a new Anthropic engine.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (proxies, testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert conversation turns to Anthropic API format with content blocks.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        let mut result = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User => {
                    result.push(ApiMessage {
                        role: "user".into(),
                        content: ApiContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant => {
                    if msg.tool_calls.is_empty() {
                        result.push(ApiMessage {
                            role: "assistant".into(),
                            content: ApiContent::Text(msg.content.clone()),
                        });
                    } else {
                        let mut blocks: Vec<ContentBlock> = Vec::new();
                        if !msg.content.is_empty() {
                            blocks.push(ContentBlock::Text {
                                text: msg.content.clone(),
                            });
                        }
                        for tc in &msg.tool_calls {
                            blocks.push(ContentBlock::ToolUse {
                                id: tc.id.clone(),
                                name: tc.name.clone(),
                                input: tc.arguments.clone(),
                            });
                        }
                        result.push(ApiMessage {
                            role: "assistant".into(),
                            content: ApiContent::Blocks(blocks),
                        });
                    }
                }
                Role::Tool => {
                    // Tool results travel as user messages with result blocks
                    let tool_call_id = msg.tool_call_id.clone().unwrap_or_default();
                    result.push(ApiMessage {
                        role: "user".into(),
                        content: ApiContent::Blocks(vec![ContentBlock::ToolResult {
                            tool_use_id: tool_call_id,
                            content: msg.content.clone(),
                        }]),
                    });
                }
            }
        }

        result
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    /// Convert an Anthropic API response into our EngineResponse.
    fn to_engine_response(resp: ApiResponse) -> EngineResponse {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                ResponseContentBlock::Text { text } => {
                    if !text_content.is_empty() {
                        text_content.push('\n');
                    }
                    text_content.push_str(&text);
                }
                ResponseContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall {
                        id,
                        name,
                        arguments: input,
                    });
                }
            }
        }

        let mut message = Message::assistant(text_content);
        message.id = resp.id;
        message.tool_calls = tool_calls;

        EngineResponse {
            message,
            usage: Some(Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            }),
            model: resp.model,
        }
    }
}

#[async_trait]
impl ReasoningEngine for AnthropicEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: EngineRequest) -> Result<EngineResponse, EngineError> {
        if self.api_key.is_empty() {
            return Err(EngineError::NotConfigured(
                "Anthropic API key is missing".into(),
            ));
        }

        let url = format!("{}/v1/messages", self.base_url);
        let api_messages = Self::to_api_messages(&request.messages);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": api_messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if !request.instructions.is_empty() {
            body["system"] = serde_json::json!(request.instructions);
        }
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(engine = "anthropic", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(e.to_string())
                } else {
                    EngineError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(EngineError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(EngineError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(EngineError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: ApiResponse = response.json().await.map_err(|e| EngineError::Api {
            status_code: 200,
            message: format!("Failed to parse Anthropic response: {e}"),
        })?;

        Ok(Self::to_engine_response(api_resp))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: ApiContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult { tool_use_id: String, content: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor() {
        let engine = AnthropicEngine::new("sk-ant-test");
        assert_eq!(engine.name(), "anthropic");
        assert_eq!(engine.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let engine = AnthropicEngine::new("sk-ant-test").with_base_url("https://proxy.example/");
        assert_eq!(engine.base_url, "https://proxy.example");
    }

    #[test]
    fn message_conversion_user_assistant() {
        let messages = vec![Message::user("Hello"), Message::assistant("Hi!")];
        let api_msgs = AnthropicEngine::to_api_messages(&messages);
        assert_eq!(api_msgs.len(), 2);
        assert_eq!(api_msgs[0].role, "user");
        assert_eq!(api_msgs[1].role, "assistant");
    }

    #[test]
    fn message_conversion_with_tool_calls() {
        let mut msg = Message::assistant("Let me search");
        msg.tool_calls = vec![ToolCall {
            id: "toolu_123".into(),
            name: "precise_search".into(),
            arguments: serde_json::json!({"query": "sms argentina"}),
        }];

        let api_msgs = AnthropicEngine::to_api_messages(&[msg]);
        assert_eq!(api_msgs.len(), 1);
        match &api_msgs[0].content {
            ApiContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2); // text + tool_use
                match &blocks[1] {
                    ContentBlock::ToolUse { id, name, input } => {
                        assert_eq!(id, "toolu_123");
                        assert_eq!(name, "precise_search");
                        assert_eq!(input["query"], "sms argentina");
                    }
                    _ => panic!("Expected tool_use block"),
                }
            }
            _ => panic!("Expected blocks content"),
        }
    }

    #[test]
    fn message_conversion_tool_result() {
        let msg = Message::tool_result("toolu_123", "search results here");
        let api_msgs = AnthropicEngine::to_api_messages(&[msg]);
        assert_eq!(api_msgs[0].role, "user"); // tool results go as user messages

        match &api_msgs[0].content {
            ApiContent::Blocks(blocks) => match &blocks[0] {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                } => {
                    assert_eq!(tool_use_id, "toolu_123");
                    assert_eq!(content, "search results here");
                }
                _ => panic!("Expected tool_result block"),
            },
            _ => panic!("Expected blocks content"),
        }
    }

    #[test]
    fn parse_text_response() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "model": "claude-sonnet-4-20250514",
                "content": [{"type": "text", "text": "Hello!"}],
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }"#,
        )
        .unwrap();

        let er = AnthropicEngine::to_engine_response(resp);
        assert_eq!(er.message.content, "Hello!");
        assert!(er.message.tool_calls.is_empty());
        assert_eq!(er.usage.unwrap().input_tokens, 10);
        assert_eq!(er.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn parse_tool_use_response() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{
                "id": "msg_02",
                "model": "claude-sonnet-4-20250514",
                "content": [
                    {"type": "text", "text": "Checking prices"},
                    {"type": "tool_use", "id": "toolu_abc", "name": "extract_page",
                     "input": {"url": "https://acme.example", "extraction_goal": "pricing"}}
                ],
                "usage": {"input_tokens": 20, "output_tokens": 10}
            }"#,
        )
        .unwrap();

        let er = AnthropicEngine::to_engine_response(resp);
        assert_eq!(er.message.content, "Checking prices");
        assert_eq!(er.message.tool_calls.len(), 1);
        assert_eq!(er.message.tool_calls[0].name, "extract_page");
        assert_eq!(
            er.message.tool_calls[0].arguments["extraction_goal"],
            "pricing"
        );
    }

    #[tokio::test]
    async fn empty_key_is_not_configured() {
        let engine = AnthropicEngine::new("");
        let err = engine
            .complete(EngineRequest {
                model: "claude-sonnet-4-20250514".into(),
                instructions: String::new(),
                messages: vec![Message::user("hi")],
                tools: vec![],
                max_tokens: 16,
                temperature: 0.3,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotConfigured(_)));
    }
}
