use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::docs::DocSummary;

/// One entry in a conversation history. Tool calls and their results are
/// first-class so the model sees what it asked for and what came back.
#[derive(Debug, Clone)]
pub enum ChatMessage {
    User(String),
    Assistant {
        text: String,
        tool_calls: Vec<ToolCall>,
    },
    ToolResults(Vec<ToolResult>),
}

/// A structured request from the model to invoke one tool.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Provider-assigned id, echoed back with the result.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Result of executing one tool call, fed back to the model.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// One model turn: any text plus zero or more tool calls. An empty
/// `tool_calls` means the turn is the final answer.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Schema for one tool, advertised to the model.
#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

/// JSON Schema for tool parameters. Always an "object" at the top level.
#[derive(Debug, Clone, Default)]
pub struct ToolParameters {
    pub properties: HashMap<String, PropertyDef>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub prop_type: String,
    pub description: String,
}

impl PropertyDef {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.into(),
        }
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self {
            prop_type: "boolean".to_string(),
            description: description.into(),
        }
    }
}

/// An interactive component a tool wants shown to the user alongside the
/// reply. Carried back through the agent reply rather than stashed in a
/// global slot, so it is scoped to the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum UiRequest {
    DocumentPicker(Vec<DocSummary>),
    Form(FormDefinition),
}

/// A modal form the agent asks the user to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub title: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    /// True for a multi-line text area (document bodies, descriptions).
    #[serde(default)]
    pub long: bool,
}
