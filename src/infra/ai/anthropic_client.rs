// =============================================================================
// ANTHROPIC MESSAGES API CLIENT
// =============================================================================
//
// Implements the ChatModel trait over the Messages API. The conversation
// model maps cleanly: our Assistant entries become assistant messages with
// text + tool_use blocks, and ToolResults entries become user messages made
// of tool_result blocks carrying the matching tool_use_id.

use std::error::Error;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::agent::{ChatMessage, ChatModel, ModelTurn, ToolCall, ToolDef};
use async_trait::async_trait;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

// =============================================================================
// REQUEST / RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

/// One content block from the response. Fields are optional because the
/// block type determines which are present.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
    id: Option<String>,
    name: Option<String>,
    input: Option<Value>,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            max_tokens: 4096,
        }
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|message| match message {
                ChatMessage::User(text) => ApiMessage {
                    role: "user",
                    content: vec![json!({ "type": "text", "text": text })],
                },
                ChatMessage::Assistant { text, tool_calls } => {
                    let mut content = Vec::new();
                    if !text.is_empty() {
                        content.push(json!({ "type": "text", "text": text }));
                    }
                    for call in tool_calls {
                        content.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        }));
                    }
                    ApiMessage {
                        role: "assistant",
                        content,
                    }
                }
                ChatMessage::ToolResults(results) => ApiMessage {
                    role: "user",
                    content: results
                        .iter()
                        .map(|result| {
                            json!({
                                "type": "tool_result",
                                "tool_use_id": result.call_id,
                                "content": result.content,
                                "is_error": result.is_error,
                            })
                        })
                        .collect(),
                },
            })
            .collect()
    }

    fn convert_tool(tool: &ToolDef) -> Value {
        let mut properties = serde_json::Map::new();
        for (name, prop) in &tool.parameters.properties {
            properties.insert(
                name.clone(),
                json!({
                    "type": prop.prop_type,
                    "description": prop.description,
                }),
            );
        }
        json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": tool.parameters.required,
            },
        })
    }

    fn parse_response(response: ApiResponse) -> ModelTurn {
        let mut turn = ModelTurn::default();
        for block in response.content {
            match block.block_type.as_str() {
                "text" => {
                    if let Some(text) = block.text {
                        if !turn.text.is_empty() {
                            turn.text.push('\n');
                        }
                        turn.text.push_str(&text);
                    }
                }
                "tool_use" => {
                    turn.tool_calls.push(ToolCall {
                        id: block.id.unwrap_or_default(),
                        name: block.name.unwrap_or_default(),
                        arguments: block.input.unwrap_or(Value::Null),
                    });
                }
                other => {
                    tracing::debug!("Ignoring response block of type '{}'", other);
                }
            }
        }
        turn
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        tools: &[ToolDef],
    ) -> Result<ModelTurn, Box<dyn Error + Send + Sync>> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: Self::convert_messages(messages),
            tools: tools.iter().map(Self::convert_tool).collect(),
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("Anthropic API error ({status}): {text}").into());
        }

        let parsed: ApiResponse = response.json().await?;
        Ok(Self::parse_response(parsed))
    }
}
