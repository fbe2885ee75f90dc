pub mod agent_service;
pub mod models;

pub use agent_service::{AgentError, AgentReply, AgentService, AgentTool, ChatModel, ToolOutput};
pub use models::{
    ChatMessage, FormDefinition, FormField, ModelTurn, PropertyDef, ToolCall, ToolDef,
    ToolParameters, ToolResult, UiRequest,
};
