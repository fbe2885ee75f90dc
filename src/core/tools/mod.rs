// The agent's tool set. Each tool is a small struct implementing `AgentTool`
// over the document-service traits; the full set is assembled once at startup
// by `default_toolset`.

pub mod diary;
pub mod forms;
pub mod gdocs;
pub mod gdrive;
pub mod local_docs;
pub mod picker;

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::agent::AgentTool;
use crate::core::docs::{DocsApi, DriveApi};

/// Assembles every tool the agent can use.
///
/// `diary_doc_id` is optional configuration; the diary tool stays registered
/// either way and explains itself when unconfigured, so the model never sees
/// a tool list that shifts between deployments.
pub fn default_toolset(
    docs: Arc<dyn DocsApi>,
    drive: Arc<dyn DriveApi>,
    workspace: PathBuf,
    diary_doc_id: Option<String>,
) -> Vec<Arc<dyn AgentTool>> {
    vec![
        // Local workspace docs
        Arc::new(local_docs::WriteDocumentTool::new(workspace.clone())),
        Arc::new(local_docs::ReadDocumentTool::new(workspace.clone())),
        Arc::new(local_docs::ListDocumentsTool::new(workspace)),
        // Google Docs diary shortcut
        Arc::new(diary::AppendDiaryTool::new(docs.clone(), diary_doc_id)),
        // Google Docs content operations
        Arc::new(gdocs::CreateGoogleDocTool::new(docs.clone())),
        Arc::new(gdocs::ReadGoogleDocTool::new(docs.clone())),
        Arc::new(gdocs::AppendGoogleDocTool::new(docs.clone())),
        Arc::new(gdocs::OverwriteGoogleDocTool::new(docs)),
        // Google Drive file management
        Arc::new(gdrive::DeleteGoogleDocTool::new(drive.clone())),
        Arc::new(gdrive::ListGoogleDocsTool::new(drive.clone())),
        // Interactive components
        Arc::new(picker::ShowDocumentPickerTool::new(drive)),
        Arc::new(forms::RequestFormTool),
    ]
}
