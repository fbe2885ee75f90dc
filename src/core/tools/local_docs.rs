// Local workspace documents: plain text files in a dedicated directory for
// notes, drafts and summaries that don't need to live in Google Drive.

use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::core::agent::{AgentTool, PropertyDef, ToolDef, ToolOutput, ToolParameters};

/// Keeps filenames inside the workspace: path separators and parent-dir
/// escapes are replaced before the name ever touches the filesystem.
fn sanitize(name: &str) -> String {
    name.replace(' ', "_")
        .replace(['/', '\\'], "_")
        .replace("..", "_")
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    filename: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    filename: String,
}

pub struct WriteDocumentTool {
    workspace: PathBuf,
}

impl WriteDocumentTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl AgentTool for WriteDocumentTool {
    fn definition(&self) -> ToolDef {
        let mut properties = HashMap::new();
        properties.insert(
            "filename".to_string(),
            PropertyDef::string("Filename with underscores, no extension. E.g. 'task_summary'"),
        );
        properties.insert(
            "content".to_string(),
            PropertyDef::string("Full text content to write"),
        );
        ToolDef {
            name: "write_document".to_string(),
            description: "Write text content to a file in the agent workspace. Use for \
                          documents, notes, drafts, summaries, or any text to save locally."
                .to_string(),
            parameters: ToolParameters {
                properties,
                required: vec!["filename".to_string(), "content".to_string()],
            },
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: WriteArgs = serde_json::from_value(args.clone())?;
        fs::create_dir_all(&self.workspace).await?;
        let path = self.workspace.join(format!("{}.txt", sanitize(&args.filename)));
        fs::write(&path, &args.content).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ToolOutput::text(format!("Saved to {name}")))
    }
}

pub struct ReadDocumentTool {
    workspace: PathBuf,
}

impl ReadDocumentTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl AgentTool for ReadDocumentTool {
    fn definition(&self) -> ToolDef {
        let mut properties = HashMap::new();
        properties.insert(
            "filename".to_string(),
            PropertyDef::string(
                "Filename without extension. Use list_documents if unsure of exact name",
            ),
        );
        ToolDef {
            name: "read_document".to_string(),
            description: "Read the contents of a previously saved local document. Use when the \
                          user wants to recall or continue working on saved text."
                .to_string(),
            parameters: ToolParameters {
                properties,
                required: vec!["filename".to_string()],
            },
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: ReadArgs = serde_json::from_value(args.clone())?;
        let safe = sanitize(&args.filename);

        for candidate in [self.workspace.join(&safe), self.workspace.join(format!("{safe}.txt"))] {
            if candidate.exists() {
                let content = fs::read_to_string(&candidate).await?;
                return Ok(ToolOutput::text(content));
            }
        }
        Ok(ToolOutput::text(format!(
            "'{}' not found. Run list_documents first.",
            args.filename
        )))
    }
}

pub struct ListDocumentsTool {
    workspace: PathBuf,
}

impl ListDocumentsTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl AgentTool for ListDocumentsTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            name: "list_documents".to_string(),
            description: "List all locally saved documents in the agent workspace. Use before \
                          reading a file to confirm its exact name."
                .to_string(),
            parameters: ToolParameters::default(),
        }
    }

    async fn run(
        &self,
        _args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        if !self.workspace.exists() {
            return Ok(ToolOutput::text("No local documents saved yet."));
        }

        let mut entries = fs::read_dir(&self.workspace).await?;
        let mut lines = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                lines.push(format!(
                    "- {} ({} bytes)",
                    entry.file_name().to_string_lossy(),
                    metadata.len()
                ));
            }
        }

        if lines.is_empty() {
            return Ok(ToolOutput::text("No local documents saved yet."));
        }
        lines.sort();
        Ok(ToolOutput::text(format!(
            "Saved files:\n{}",
            lines.join("\n")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn sanitize_blocks_path_escapes() {
        assert_eq!(sanitize("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize("my draft"), "my_draft");
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().to_path_buf();

        WriteDocumentTool::new(workspace.clone())
            .run(&json!({"filename": "my draft", "content": "hello world"}))
            .await
            .unwrap();

        let out = ReadDocumentTool::new(workspace)
            .run(&json!({"filename": "my_draft"}))
            .await
            .unwrap();
        assert_eq!(out.text, "hello world");
    }

    #[tokio::test]
    async fn missing_file_suggests_listing() {
        let dir = TempDir::new().unwrap();
        let out = ReadDocumentTool::new(dir.path().to_path_buf())
            .run(&json!({"filename": "nope"}))
            .await
            .unwrap();
        assert!(out.text.contains("list_documents"));
    }

    #[tokio::test]
    async fn listing_shows_files_with_sizes() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().to_path_buf();
        let writer = WriteDocumentTool::new(workspace.clone());
        writer
            .run(&json!({"filename": "a", "content": "12345"}))
            .await
            .unwrap();

        let out = ListDocumentsTool::new(workspace).run(&json!({})).await.unwrap();
        assert!(out.text.contains("a.txt (5 bytes)"));
    }

    #[tokio::test]
    async fn listing_an_empty_workspace() {
        let out = ListDocumentsTool::new(PathBuf::from("does/not/exist"))
            .run(&json!({}))
            .await
            .unwrap();
        assert_eq!(out.text, "No local documents saved yet.");
    }
}
