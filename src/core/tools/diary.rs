// Diary shortcut: append a timestamped entry to one configured Google Doc.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;

use crate::core::agent::{AgentTool, PropertyDef, ToolDef, ToolOutput, ToolParameters};
use crate::core::docs::DocsApi;

#[derive(Debug, Deserialize)]
struct DiaryArgs {
    entry: String,
}

pub struct AppendDiaryTool {
    docs: Arc<dyn DocsApi>,
    doc_id: Option<String>,
}

impl AppendDiaryTool {
    pub fn new(docs: Arc<dyn DocsApi>, doc_id: Option<String>) -> Self {
        Self { docs, doc_id }
    }

    fn format_entry(entry: &str, stamp: &str) -> String {
        format!("\n[{stamp}]\n{entry}\n")
    }
}

#[async_trait]
impl AgentTool for AppendDiaryTool {
    fn definition(&self) -> ToolDef {
        let mut properties = HashMap::new();
        properties.insert(
            "entry".to_string(),
            PropertyDef::string(
                "The diary entry text. Timestamps and formatting are handled automatically.",
            ),
        );
        ToolDef {
            name: "append_diary".to_string(),
            description: "Add a timestamped entry to the diary Google Doc. Use when the user \
                          shares something that happened, wants to log their day, record a \
                          thought, or journal anything."
                .to_string(),
            parameters: ToolParameters {
                properties,
                required: vec!["entry".to_string()],
            },
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let Some(doc_id) = &self.doc_id else {
            return Ok(ToolOutput::text(
                "No diary doc configured. Set GOOGLE_DIARY_DOC_ID in .env, or use \
                 append_google_doc with a specific doc.",
            ));
        };

        let args: DiaryArgs = serde_json::from_value(args.clone())?;
        let stamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
        self.docs
            .append(doc_id, &Self::format_entry(&args.entry, &stamp))
            .await?;
        Ok(ToolOutput::text(format!(
            "Diary entry added at {}",
            Local::now().format("%H:%M")
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
        async fn create(&self, _title: &str, _initial_content: &str) -> Result<String, DocsError> {
            unimplemented!()
        }

        async fn read(&self, _doc_id: &str) -> Result<DocContent, DocsError> {
            unimplemented!()
        }

        async fn append(&self, doc_id: &str, text: &str) -> Result<(), DocsError> {
            self.appended
                .lock()
                .unwrap()
                .push((doc_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn overwrite(&self, _doc_id: &str, _new_content: &str) -> Result<(), DocsError> {
            unimplemented!()
        }
    }

    #[test]
    fn entry_gets_stamp_and_surrounding_newlines() {
        let text = AppendDiaryTool::format_entry("went hiking", "2026-08-30 14:00");
        assert_eq!(text, "\n[2026-08-30 14:00]\nwent hiking\n");
    }

    #[tokio::test]
    async fn unconfigured_diary_explains_instead_of_failing() {
        let tool = AppendDiaryTool::new(Arc::new(FakeDocs::default()), None);
        let out = tool.run(&json!({"entry": "hello"})).await.unwrap();
        assert!(out.text.contains("GOOGLE_DIARY_DOC_ID"));
    }

    #[tokio::test]
    async fn entry_goes_to_the_configured_doc() {
        let docs = Arc::new(FakeDocs::default());
        let tool = AppendDiaryTool::new(docs.clone(), Some("diary-1".to_string()));
        tool.run(&json!({"entry": "went hiking"})).await.unwrap();

        let appended = docs.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].0, "diary-1");
        assert!(appended[0].1.contains("went hiking"));
    }
}
