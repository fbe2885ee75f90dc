// File management through the Drive REST API (v3): listing the user's Google
// Docs and permanent deletion. Content operations live in docs_client.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;

use crate::core::auth::AccessTokenProvider;
use crate::core::docs::{DocSummary, DocsError, DriveApi};
use async_trait::async_trait;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3/files";
const DOC_MIME_TYPE: &str = "application/vnd.google-apps.document";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    modified_time: Option<String>,
}

impl From<DriveFile> for DocSummary {
    fn from(file: DriveFile) -> Self {
        DocSummary {
            id: file.id,
            name: file.name,
            modified: file.modified_time.unwrap_or_default(),
        }
    }
}

pub struct GoogleDriveClient {
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GoogleDriveClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client: Client::new(),
            tokens,
        }
    }
}

#[async_trait]
impl DriveApi for GoogleDriveClient {
    async fn list_docs(&self, page_size: u32) -> Result<Vec<DocSummary>, DocsError> {
        let token = self.tokens.access_token().await?;
        let query = format!("mimeType='{DOC_MIME_TYPE}' and trashed=false");

        let response = self
            .client
            .get(DRIVE_API_BASE)
            .bearer_auth(&token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name, modifiedTime)"),
                ("orderBy", "modifiedTime desc"),
                ("pageSize", &page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Api(format!("{status}: {text}")));
        }

        let list: FileList = response
            .json()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;
        Ok(list.files.into_iter().map(DocSummary::from).collect())
    }

    async fn delete(&self, doc_id: &str) -> Result<(), DocsError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .delete(format!("{DRIVE_API_BASE}/{doc_id}"))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Api(format!("{status}: {text}")));
        }

        tracing::info!("Deleted Google Doc {}", doc_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_list_maps_to_summaries() {
        let json = r#"{
            "files": [
                { "id": "a", "name": "Notes", "modifiedTime": "2026-08-01T10:00:00.000Z" },
                { "id": "b", "name": "Draft" }
            ]
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        let docs: Vec<DocSummary> = list.files.into_iter().map(DocSummary::from).collect();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].modified_date(), "2026-08-01");
        assert_eq!(docs[1].modified, "");
    }

    #[test]
    fn empty_response_parses_to_no_files() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }
}
