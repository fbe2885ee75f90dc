// Google Docs content tools: create, read, append, overwrite.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::agent::{AgentTool, PropertyDef, ToolDef, ToolOutput, ToolParameters};
use crate::core::docs::DocsApi;

#[derive(Debug, Deserialize)]
struct CreateArgs {
    title: String,
    #[serde(default)]
    initial_content: String,
}

#[derive(Debug, Deserialize)]
struct DocIdArgs {
    doc_id: String,
}

#[derive(Debug, Deserialize)]
struct AppendArgs {
    doc_id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct OverwriteArgs {
    doc_id: String,
    new_content: String,
}

fn doc_id_parameters() -> ToolParameters {
    let mut properties = HashMap::new();
    properties.insert(
        "doc_id".to_string(),
        PropertyDef::string("The Google Doc document ID"),
    );
    ToolParameters {
        properties,
        required: vec!["doc_id".to_string()],
    }
}

pub struct CreateGoogleDocTool {
    docs: Arc<dyn DocsApi>,
}

impl CreateGoogleDocTool {
    pub fn new(docs: Arc<dyn DocsApi>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl AgentTool for CreateGoogleDocTool {
    fn definition(&self) -> ToolDef {
        let mut properties = HashMap::new();
        properties.insert(
            "title".to_string(),
            PropertyDef::string("Title for the new Google Doc"),
        );
        properties.insert(
            "initial_content".to_string(),
            PropertyDef::string("Optional initial text content to populate the doc"),
        );
        ToolDef {
            name: "create_google_doc".to_string(),
            description: "Create a new Google Doc with a given title and optional initial content. \
                          Returns the document ID needed for future operations. \
                          Always confirm the title with the user before creating."
                .to_string(),
            parameters: ToolParameters {
                properties,
                required: vec!["title".to_string()],
            },
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: CreateArgs = serde_json::from_value(args.clone())?;
        let doc_id = self.docs.create(&args.title, &args.initial_content).await?;
        Ok(ToolOutput::text(format!(
            "Created Google Doc '{}' with ID {}",
            args.title, doc_id
        )))
    }
}

pub struct ReadGoogleDocTool {
    docs: Arc<dyn DocsApi>,
}

impl ReadGoogleDocTool {
    pub fn new(docs: Arc<dyn DocsApi>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl AgentTool for ReadGoogleDocTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            name: "read_google_doc".to_string(),
            description: "Read the full text content of a Google Doc by its document ID. \
                          Use show_document_picker first if you don't have the ID."
                .to_string(),
            parameters: doc_id_parameters(),
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: DocIdArgs = serde_json::from_value(args.clone())?;
        let content = self.docs.read(&args.doc_id).await?;
        Ok(ToolOutput::text(format!(
            "# {}\n\n{}",
            content.title, content.text
        )))
    }
}

pub struct AppendGoogleDocTool {
    docs: Arc<dyn DocsApi>,
}

impl AppendGoogleDocTool {
    pub fn new(docs: Arc<dyn DocsApi>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl AgentTool for AppendGoogleDocTool {
    fn definition(&self) -> ToolDef {
        let mut parameters = doc_id_parameters();
        parameters.properties.insert(
            "text".to_string(),
            PropertyDef::string("Text to append at the end of the document"),
        );
        parameters.required.push("text".to_string());
        ToolDef {
            name: "append_google_doc".to_string(),
            description: "Append text to the end of an existing Google Doc without touching \
                          existing content. Ideal for adding notes, diary entries, or \
                          continuing a document."
                .to_string(),
            parameters,
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: AppendArgs = serde_json::from_value(args.clone())?;
        self.docs.append(&args.doc_id, &args.text).await?;
        Ok(ToolOutput::text(format!(
            "Text appended to doc {}.",
            args.doc_id
        )))
    }
}

pub struct OverwriteGoogleDocTool {
    docs: Arc<dyn DocsApi>,
}

impl OverwriteGoogleDocTool {
    pub fn new(docs: Arc<dyn DocsApi>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl AgentTool for OverwriteGoogleDocTool {
    fn definition(&self) -> ToolDef {
        let mut parameters = doc_id_parameters();
        parameters.properties.insert(
            "new_content".to_string(),
            PropertyDef::string("New full content that replaces everything currently in the document"),
        );
        parameters.required.push("new_content".to_string());
        ToolDef {
            name: "overwrite_google_doc".to_string(),
            description: "Replace the entire content of an existing Google Doc with new text. \
                          ALWAYS confirm with the user before calling this; it cannot be \
                          undone easily."
                .to_string(),
            parameters,
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: OverwriteArgs = serde_json::from_value(args.clone())?;
        self.docs.overwrite(&args.doc_id, &args.new_content).await?;
        Ok(ToolOutput::text(format!(
            "Doc {} overwritten successfully.",
            args.doc_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::docs::{DocContent, DocsError};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDocs {
        appended: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DocsApi for FakeDocs {
        async fn create(&self, title: &str, _initial_content: &str) -> Result<String, DocsError> {
            Ok(format!("id-for-{title}"))
        }

        async fn read(&self, doc_id: &str) -> Result<DocContent, DocsError> {
            Ok(DocContent {
                title: format!("Doc {doc_id}"),
                text: "body".to_string(),
            })
        }

        async fn append(&self, doc_id: &str, text: &str) -> Result<(), DocsError> {
            self.appended
                .lock()
                .unwrap()
                .push((doc_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn overwrite(&self, _doc_id: &str, _new_content: &str) -> Result<(), DocsError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_reports_the_new_id() {
        let tool = CreateGoogleDocTool::new(Arc::new(FakeDocs::default()));
        let out = tool.run(&json!({"title": "Notes"})).await.unwrap();
        assert!(out.text.contains("id-for-Notes"));
        assert!(out.ui.is_none());
    }

    #[tokio::test]
    async fn read_formats_title_and_body() {
        let tool = ReadGoogleDocTool::new(Arc::new(FakeDocs::default()));
        let out = tool.run(&json!({"doc_id": "abc"})).await.unwrap();
        assert_eq!(out.text, "# Doc abc\n\nbody");
    }

    #[tokio::test]
    async fn append_passes_arguments_through() {
        let docs = Arc::new(FakeDocs::default());
        let tool = AppendGoogleDocTool::new(docs.clone());
        tool.run(&json!({"doc_id": "abc", "text": "hello"}))
            .await
            .unwrap();
        assert_eq!(
            docs.appended.lock().unwrap().as_slice(),
            &[("abc".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_argument_is_an_error() {
        let tool = AppendGoogleDocTool::new(Arc::new(FakeDocs::default()));
        assert!(tool.run(&json!({"doc_id": "abc"})).await.is_err());
    }
}
