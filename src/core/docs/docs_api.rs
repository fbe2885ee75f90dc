// Document-service abstractions the tools are written against.
//
// The core layer only knows "documents" and "drive files"; whether they come
// from the Google Docs API, the Drive API, or a test double is an infra
// concern. The two traits split along the upstream API boundary: content
// operations (Docs API) vs file management (Drive API).

use async_trait::async_trait;
use thiserror::Error;

use crate::core::auth::AuthError;

#[derive(Debug, Error)]
pub enum DocsError {
    /// Credential resolution failed; the message carries remediation text.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Google API error: {0}")]
    Api(String),
}

/// One Drive file as shown in listings and the document picker.
#[derive(Debug, Clone, PartialEq)]
pub struct DocSummary {
    pub id: String,
    pub name: String,
    /// RFC 3339 modification timestamp as reported by Drive.
    pub modified: String,
}

impl DocSummary {
    /// The date part of the modification timestamp, for compact display.
    pub fn modified_date(&self) -> &str {
        let end = self.modified.len().min(10);
        &self.modified[..end]
    }
}

/// Full document content as returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub struct DocContent {
    pub title: String,
    pub text: String,
}

/// Content operations on individual documents.
#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Creates a document and returns its id.
    async fn create(&self, title: &str, initial_content: &str) -> Result<String, DocsError>;

    async fn read(&self, doc_id: &str) -> Result<DocContent, DocsError>;

    /// Appends text at the end without touching existing content.
    async fn append(&self, doc_id: &str, text: &str) -> Result<(), DocsError>;

    /// Replaces the entire document body.
    async fn overwrite(&self, doc_id: &str, new_content: &str) -> Result<(), DocsError>;
}

/// File management operations that the Docs API doesn't offer.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Lists the user's Google Docs, newest-modified first.
    async fn list_docs(&self, page_size: u32) -> Result<Vec<DocSummary>, DocsError>;

    /// Permanently deletes a document.
    async fn delete(&self, doc_id: &str) -> Result<(), DocsError>;
}
