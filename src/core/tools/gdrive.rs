// Google Drive file-management tools: delete and text listing.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::agent::{AgentTool, PropertyDef, ToolDef, ToolOutput, ToolParameters};
use crate::core::docs::DriveApi;

const LIST_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
struct DocIdArgs {
    doc_id: String,
}

pub struct DeleteGoogleDocTool {
    drive: Arc<dyn DriveApi>,
}

impl DeleteGoogleDocTool {
    pub fn new(drive: Arc<dyn DriveApi>) -> Self {
        Self { drive }
    }
}

#[async_trait]
impl AgentTool for DeleteGoogleDocTool {
    fn definition(&self) -> ToolDef {
        let mut properties = HashMap::new();
        properties.insert(
            "doc_id".to_string(),
            PropertyDef::string("The Google Doc document ID"),
        );
        ToolDef {
            name: "delete_google_doc".to_string(),
            description: "Permanently delete a Google Doc by its document ID. ALWAYS ask the \
                          user to confirm by document name before calling this; deletion \
                          cannot be undone."
                .to_string(),
            parameters: ToolParameters {
                properties,
                required: vec!["doc_id".to_string()],
            },
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: DocIdArgs = serde_json::from_value(args.clone())?;
        self.drive.delete(&args.doc_id).await?;
        Ok(ToolOutput::text(format!(
            "Doc {} permanently deleted.",
            args.doc_id
        )))
    }
}

pub struct ListGoogleDocsTool {
    drive: Arc<dyn DriveApi>,
}

impl ListGoogleDocsTool {
    pub fn new(drive: Arc<dyn DriveApi>) -> Self {
        Self { drive }
    }
}

#[async_trait]
impl AgentTool for ListGoogleDocsTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            name: "list_google_docs".to_string(),
            description: "List all Google Docs in the user's Drive with names, IDs, and \
                          last-modified dates. Prefer show_document_picker for interactive \
                          selection. Use this only when you need the list as text (e.g. to \
                          summarise what documents exist)."
                .to_string(),
            parameters: ToolParameters::default(),
        }
    }

    async fn run(
        &self,
        _args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let docs = self.drive.list_docs(LIST_PAGE_SIZE).await?;
        if docs.is_empty() {
            return Ok(ToolOutput::text("No Google Docs found."));
        }
        let lines: Vec<String> = docs
            .iter()
            .map(|d| {
                format!(
                    "- {} (ID: {}, modified: {})",
                    d.name,
                    d.id,
                    d.modified_date()
                )
            })
            .collect();
        Ok(ToolOutput::text(format!(
            "Google Docs:\n{}",
            lines.join("\n")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::docs::{DocSummary, DocsError};
    use serde_json::json;

    struct FakeDrive {
        docs: Vec<DocSummary>,
    }

    #[async_trait]
    impl DriveApi for FakeDrive {
        async fn list_docs(&self, _page_size: u32) -> Result<Vec<DocSummary>, DocsError> {
            Ok(self.docs.clone())
        }

        async fn delete(&self, doc_id: &str) -> Result<(), DocsError> {
            if doc_id == "missing" {
                return Err(DocsError::Api("404 not found".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn list_renders_names_ids_and_dates() {
        let tool = ListGoogleDocsTool::new(Arc::new(FakeDrive {
            docs: vec![DocSummary {
                id: "d1".to_string(),
                name: "Journal".to_string(),
                modified: "2026-08-01T10:00:00Z".to_string(),
            }],
        }));

        let out = tool.run(&json!({})).await.unwrap();
        assert!(out.text.contains("Journal"));
        assert!(out.text.contains("ID: d1"));
        assert!(out.text.contains("2026-08-01"));
    }

    #[tokio::test]
    async fn list_handles_empty_drive() {
        let tool = ListGoogleDocsTool::new(Arc::new(FakeDrive { docs: Vec::new() }));
        let out = tool.run(&json!({})).await.unwrap();
        assert_eq!(out.text, "No Google Docs found.");
    }

    #[tokio::test]
    async fn delete_error_propagates() {
        let tool = DeleteGoogleDocTool::new(Arc::new(FakeDrive { docs: Vec::new() }));
        let err = tool.run(&json!({"doc_id": "missing"})).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
