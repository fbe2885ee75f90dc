// The tool-invocation loop.
//
// One user message is processed to completion here: the model is asked what
// to do, any tool calls it makes are executed and their results appended to
// the conversation, and the loop repeats until the model answers without
// calling tools (or the step cap trips). Tool failures are fed back to the
// model as error results rather than aborting the turn; the model is usually
// able to relay them in plain language or try something else.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error as ThisError;

use super::models::{ChatMessage, ModelTurn, ToolCall, ToolDef, ToolResult, UiRequest};

/// Tool calls per message before the loop gives up. High enough for any
/// legitimate multi-step task (list, pick, read, edit), low enough to stop a
/// model stuck calling the same tool forever.
const MAX_STEPS: usize = 8;

/// Oldest history entries are dropped beyond this many per session.
const MAX_HISTORY: usize = 60;

/// The language model behind the agent, as a black box: given the
/// conversation so far and the available tools, produce the next turn.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        tools: &[ToolDef],
    ) -> Result<ModelTurn, Box<dyn Error + Send + Sync>>;
}

/// What a tool produced: text for the model, and optionally an interactive
/// component for the user.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
    pub ui: Option<UiRequest>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ui: None,
        }
    }

    pub fn with_ui(text: impl Into<String>, ui: UiRequest) -> Self {
        Self {
            text: text.into(),
            ui: Some(ui),
        }
    }
}

/// A tool the agent can dispatch: a schema plus an execute function.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn definition(&self) -> ToolDef;

    async fn run(&self, args: &serde_json::Value)
        -> Result<ToolOutput, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, ThisError)]
pub enum AgentError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Stopped after {0} tool steps without a final answer")]
    StepLimit(usize),
}

/// The agent's answer for one user message.
#[derive(Debug)]
pub struct AgentReply {
    pub text: String,
    /// Picker or form queued by a tool during this request, if any.
    pub ui: Option<UiRequest>,
}

pub struct AgentService<M: ChatModel> {
    model: M,
    tools: Vec<Arc<dyn AgentTool>>,
    system_prompt: String,
    /// Conversation history per session id (we use the Discord user id, which
    /// also serializes continuations per user).
    sessions: DashMap<String, Vec<ChatMessage>>,
}

impl<M: ChatModel> AgentService<M> {
    pub fn new(model: M, tools: Vec<Arc<dyn AgentTool>>, system_prompt: String) -> Self {
        Self {
            model,
            tools,
            system_prompt,
            sessions: DashMap::new(),
        }
    }

    /// Runs the loop for one inbound message and returns the final reply.
    pub async fn handle_message(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<AgentReply, AgentError> {
        let mut history = self
            .sessions
            .get(session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        history.push(ChatMessage::User(content.to_string()));

        let tool_defs: Vec<ToolDef> = self.tools.iter().map(|t| t.definition()).collect();
        let mut pending_ui: Option<UiRequest> = None;

        for _ in 0..MAX_STEPS {
            let turn = self
                .model
                .complete(&self.system_prompt, &history, &tool_defs)
                .await
                .map_err(|e| AgentError::Model(e.to_string()))?;

            if turn.tool_calls.is_empty() {
                history.push(ChatMessage::Assistant {
                    text: turn.text.clone(),
                    tool_calls: Vec::new(),
                });
                self.store_history(session_id, history);
                return Ok(AgentReply {
                    text: turn.text,
                    ui: pending_ui,
                });
            }

            let mut results = Vec::with_capacity(turn.tool_calls.len());
            for call in &turn.tool_calls {
                match self.dispatch(call).await {
                    Ok(output) => {
                        tracing::debug!(tool = %call.name, "Tool call succeeded");
                        if output.ui.is_some() {
                            pending_ui = output.ui;
                        }
                        results.push(ToolResult {
                            call_id: call.id.clone(),
                            content: output.text,
                            is_error: false,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(tool = %call.name, "Tool call failed: {}", e);
                        results.push(ToolResult {
                            call_id: call.id.clone(),
                            content: e.to_string(),
                            is_error: true,
                        });
                    }
                }
            }

            history.push(ChatMessage::Assistant {
                text: turn.text,
                tool_calls: turn.tool_calls,
            });
            history.push(ChatMessage::ToolResults(results));
        }

        self.store_history(session_id, history);
        Err(AgentError::StepLimit(MAX_STEPS))
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition().name == call.name)
            .ok_or_else(|| format!("Unknown tool: {}", call.name))?;
        tool.run(&call.arguments).await
    }

    fn store_history(&self, session_id: &str, mut history: Vec<ChatMessage>) {
        if history.len() > MAX_HISTORY {
            history.drain(..history.len() - MAX_HISTORY);
        }
        self.sessions.insert(session_id.to_string(), history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::models::{FormDefinition, ToolParameters};
    use std::sync::Mutex;

    /// Replays a fixed sequence of turns and records what it was shown.
    struct ScriptedModel {
        turns: Mutex<Vec<ModelTurn>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            _system_prompt: &str,
            messages: &[ChatMessage],
            _tools: &[ToolDef],
        ) -> Result<ModelTurn, Box<dyn Error + Send + Sync>> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let mut turns = self.turns.lock().unwrap();
            if turns.is_empty() {
                return Err("script exhausted".into());
            }
            Ok(turns.remove(0))
        }
    }

    struct EchoTool {
        fail: bool,
        ui: Option<UiRequest>,
    }

    #[async_trait]
    impl AgentTool for EchoTool {
        fn definition(&self) -> ToolDef {
            ToolDef {
                name: "echo".to_string(),
                description: "Echoes its input back.".to_string(),
                parameters: ToolParameters::default(),
            }
        }

        async fn run(
            &self,
            args: &serde_json::Value,
        ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
            if self.fail {
                return Err("echo exploded".into());
            }
            let text = format!("echo: {}", args);
            Ok(match &self.ui {
                Some(ui) => ToolOutput::with_ui(text, ui.clone()),
                None => ToolOutput::text(text),
            })
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: "call-1".to_string(),
            name: name.to_string(),
            arguments: serde_json::json!({"value": 1}),
        }
    }

    #[tokio::test]
    async fn plain_answer_passes_through() {
        let model = ScriptedModel::new(vec![ModelTurn {
            text: "hi there".to_string(),
            tool_calls: Vec::new(),
        }]);
        let agent = AgentService::new(model, Vec::new(), "system".to_string());

        let reply = agent.handle_message("u1", "hello").await.unwrap();
        assert_eq!(reply.text, "hi there");
        assert!(reply.ui.is_none());
    }

    #[tokio::test]
    async fn tool_call_result_is_fed_back() {
        let model = ScriptedModel::new(vec![
            ModelTurn {
                text: String::new(),
                tool_calls: vec![call("echo")],
            },
            ModelTurn {
                text: "done".to_string(),
                tool_calls: Vec::new(),
            },
        ]);
        let tools: Vec<Arc<dyn AgentTool>> = vec![Arc::new(EchoTool {
            fail: false,
            ui: None,
        })];
        let agent = AgentService::new(model, tools, "system".to_string());

        let reply = agent.handle_message("u1", "use the tool").await.unwrap();
        assert_eq!(reply.text, "done");

        // Second model invocation must have seen the tool result.
        let seen = agent.model.seen.lock().unwrap();
        let last = seen[1].last().unwrap().clone();
        match last {
            ChatMessage::ToolResults(results) => {
                assert_eq!(results.len(), 1);
                assert!(!results[0].is_error);
                assert!(results[0].content.starts_with("echo:"));
            }
            other => panic!("expected tool results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn tool_failure_becomes_error_result_not_crash() {
        let model = ScriptedModel::new(vec![
            ModelTurn {
                text: String::new(),
                tool_calls: vec![call("echo")],
            },
            ModelTurn {
                text: "the tool failed".to_string(),
                tool_calls: Vec::new(),
            },
        ]);
        let tools: Vec<Arc<dyn AgentTool>> = vec![Arc::new(EchoTool {
            fail: true,
            ui: None,
        })];
        let agent = AgentService::new(model, tools, "system".to_string());

        let reply = agent.handle_message("u1", "go").await.unwrap();
        assert_eq!(reply.text, "the tool failed");

        let seen = agent.model.seen.lock().unwrap();
        match seen[1].last().unwrap() {
            ChatMessage::ToolResults(results) => {
                assert!(results[0].is_error);
                assert_eq!(results[0].content, "echo exploded");
            }
            other => panic!("expected tool results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_tool_reported_to_model() {
        let model = ScriptedModel::new(vec![
            ModelTurn {
                text: String::new(),
                tool_calls: vec![call("no_such_tool")],
            },
            ModelTurn {
                text: "ok".to_string(),
                tool_calls: Vec::new(),
            },
        ]);
        let agent = AgentService::new(model, Vec::new(), "system".to_string());

        agent.handle_message("u1", "go").await.unwrap();
        let seen = agent.model.seen.lock().unwrap();
        match seen[1].last().unwrap() {
            ChatMessage::ToolResults(results) => {
                assert!(results[0].is_error);
                assert!(results[0].content.contains("no_such_tool"));
            }
            other => panic!("expected tool results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn ui_request_rides_on_the_reply() {
        let form = FormDefinition {
            title: "New doc".to_string(),
            fields: Vec::new(),
        };
        let model = ScriptedModel::new(vec![
            ModelTurn {
                text: String::new(),
                tool_calls: vec![call("echo")],
            },
            ModelTurn {
                text: "click the button".to_string(),
                tool_calls: Vec::new(),
            },
        ]);
        let tools: Vec<Arc<dyn AgentTool>> = vec![Arc::new(EchoTool {
            fail: false,
            ui: Some(UiRequest::Form(form.clone())),
        })];
        let agent = AgentService::new(model, tools, "system".to_string());

        let reply = agent.handle_message("u1", "go").await.unwrap();
        assert_eq!(reply.ui, Some(UiRequest::Form(form)));
    }

    #[tokio::test]
    async fn sessions_keep_history_between_messages() {
        let model = ScriptedModel::new(vec![
            ModelTurn {
                text: "first".to_string(),
                tool_calls: Vec::new(),
            },
            ModelTurn {
                text: "second".to_string(),
                tool_calls: Vec::new(),
            },
        ]);
        let agent = AgentService::new(model, Vec::new(), "system".to_string());

        agent.handle_message("u1", "one").await.unwrap();
        agent.handle_message("u1", "two").await.unwrap();

        let seen = agent.model.seen.lock().unwrap();
        // Second call sees: user one, assistant first, user two.
        assert_eq!(seen[1].len(), 3);
    }
}
