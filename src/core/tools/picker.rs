// Document picker tool.
//
// The agent calls show_document_picker when it needs the user to choose a
// Google Doc. The listing comes back as text for the model, and the same
// listing rides on the reply as a `UiRequest` so the Discord layer can render
// a Select menu instead of asking the user to type a document ID.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::agent::{AgentTool, ToolDef, ToolOutput, ToolParameters, UiRequest};
use crate::core::docs::DriveApi;

/// Discord Select menus carry at most 25 options.
const PICKER_PAGE_SIZE: u32 = 25;

pub struct ShowDocumentPickerTool {
    drive: Arc<dyn DriveApi>,
}

impl ShowDocumentPickerTool {
    pub fn new(drive: Arc<dyn DriveApi>) -> Self {
        Self { drive }
    }
}

#[async_trait]
impl AgentTool for ShowDocumentPickerTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            name: "show_document_picker".to_string(),
            description: "Show the user a Discord Select menu listing their Google Docs so they \
                          can pick one. Use this any time you need a document ID; never ask \
                          the user to type one manually. After calling this tool, tell the user \
                          a document picker will appear below your message."
                .to_string(),
            parameters: ToolParameters::default(),
        }
    }

    async fn run(
        &self,
        _args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let docs = self.drive.list_docs(PICKER_PAGE_SIZE).await?;
        if docs.is_empty() {
            return Ok(ToolOutput::text(
                "No Google Docs found in the user's Drive.",
            ));
        }

        let names: Vec<String> = docs.iter().map(|d| format!("- {}", d.name)).collect();
        let text = format!(
            "Picker queued with {} documents:\n{}",
            docs.len(),
            names.join("\n")
        );
        Ok(ToolOutput::with_ui(text, UiRequest::DocumentPicker(docs)))
    }
}
