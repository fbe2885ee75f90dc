// =============================================================================
// GOOGLE DOCS API CLIENT
// =============================================================================
//
// Content operations against the Docs REST API (v1). Every call resolves the
// bearer token through the injected AccessTokenProvider, so the document
// belongs to whichever user is bound when the call happens.
//
// Index arithmetic: a Docs body always ends with a trailing newline that can
// never be edited, so the usable range is [1, end_index - 1]. Appends insert
// at end_index - 1; overwrite deletes [1, end_index - 1] then inserts at 1.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::auth::AccessTokenProvider;
use crate::core::docs::{DocContent, DocsApi, DocsError};
use async_trait::async_trait;

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1/documents";

// =============================================================================
// API RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    document_id: Option<String>,
    title: Option<String>,
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Body {
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuralElement {
    end_index: Option<i64>,
    paragraph: Option<Paragraph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paragraph {
    elements: Vec<ParagraphElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParagraphElement {
    text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRun {
    content: Option<String>,
}

impl Document {
    /// Concatenates all paragraph text runs, in document order.
    fn extract_text(&self) -> String {
        let mut text = String::new();
        if let Some(body) = &self.body {
            for element in &body.content {
                if let Some(paragraph) = &element.paragraph {
                    for para_element in &paragraph.elements {
                        if let Some(run) = &para_element.text_run {
                            if let Some(content) = &run.content {
                                text.push_str(content);
                            }
                        }
                    }
                }
            }
        }
        text
    }

    /// Index just past the last element, needed for append/overwrite ranges.
    fn end_index(&self) -> i64 {
        self.body
            .as_ref()
            .and_then(|b| b.content.last())
            .and_then(|e| e.end_index)
            .unwrap_or(1)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoogleDocsClient {
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GoogleDocsClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client: Client::new(),
            tokens,
        }
    }

    async fn fetch_document(&self, doc_id: &str) -> Result<Document, DocsError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(format!("{DOCS_API_BASE}/{doc_id}"))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Api(format!("{status}: {text}")));
        }

        response
            .json()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))
    }

    async fn batch_update(
        &self,
        doc_id: &str,
        requests: serde_json::Value,
    ) -> Result<(), DocsError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(format!("{DOCS_API_BASE}/{doc_id}:batchUpdate"))
            .bearer_auth(&token)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Api(format!("{status}: {text}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocsApi for GoogleDocsClient {
    async fn create(&self, title: &str, initial_content: &str) -> Result<String, DocsError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(DOCS_API_BASE)
            .bearer_auth(&token)
            .json(&json!({ "title": title }))
            .send()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Api(format!("{status}: {text}")));
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| DocsError::Api(e.to_string()))?;
        let doc_id = document
            .document_id
            .ok_or_else(|| DocsError::Api("create response had no documentId".to_string()))?;

        if !initial_content.is_empty() {
            self.batch_update(
                &doc_id,
                json!([{
                    "insertText": {
                        "location": { "index": 1 },
                        "text": initial_content,
                    }
                }]),
            )
            .await?;
        }

        tracing::info!("Created Google Doc '{}' ({})", title, doc_id);
        Ok(doc_id)
    }

    async fn read(&self, doc_id: &str) -> Result<DocContent, DocsError> {
        let document = self.fetch_document(doc_id).await?;
        Ok(DocContent {
            title: document.title.clone().unwrap_or_default(),
            text: document.extract_text(),
        })
    }

    async fn append(&self, doc_id: &str, text: &str) -> Result<(), DocsError> {
        let document = self.fetch_document(doc_id).await?;
        // Insert before the immutable trailing newline.
        let index = (document.end_index() - 1).max(1);
        self.batch_update(
            doc_id,
            json!([{
                "insertText": {
                    "location": { "index": index },
                    "text": text,
                }
            }]),
        )
        .await
    }

    async fn overwrite(&self, doc_id: &str, new_content: &str) -> Result<(), DocsError> {
        let document = self.fetch_document(doc_id).await?;
        let end_index = document.end_index();

        let mut requests = Vec::new();
        // A body with only the trailing newline has nothing to delete.
        if end_index > 2 {
            requests.push(json!({
                "deleteContentRange": {
                    "range": { "startIndex": 1, "endIndex": end_index - 1 }
                }
            }));
        }
        if !new_content.is_empty() {
            requests.push(json!({
                "insertText": {
                    "location": { "index": 1 },
                    "text": new_content,
                }
            }));
        }
        if requests.is_empty() {
            return Ok(());
        }
        self.batch_update(doc_id, serde_json::Value::Array(requests))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_document(json: &str) -> Document {
        serde_json::from_str(json).unwrap()
    }

    const DOC_JSON: &str = r#"{
        "documentId": "doc-1",
        "title": "Meeting Notes",
        "body": {
            "content": [
                { "endIndex": 1, "sectionBreak": {} },
                {
                    "endIndex": 13,
                    "paragraph": {
                        "elements": [
                            { "textRun": { "content": "First line.\n" } }
                        ]
                    }
                },
                {
                    "endIndex": 26,
                    "paragraph": {
                        "elements": [
                            { "textRun": { "content": "Second " } },
                            { "textRun": { "content": "line.\n" } }
                        ]
                    }
                }
            ]
        }
    }"#;

    #[test]
    fn extract_text_joins_all_runs_in_order() {
        let document = parse_document(DOC_JSON);
        assert_eq!(document.extract_text(), "First line.\nSecond line.\n");
    }

    #[test]
    fn end_index_comes_from_the_last_element() {
        let document = parse_document(DOC_JSON);
        assert_eq!(document.end_index(), 26);
    }

    #[test]
    fn empty_body_defaults_to_index_one() {
        let document = parse_document(r#"{"documentId": "d", "title": "t"}"#);
        assert_eq!(document.end_index(), 1);
        assert_eq!(document.extract_text(), "");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{
            "documentId": "d",
            "title": "t",
            "revisionId": "r",
            "body": { "content": [ { "endIndex": 5, "tableOfContents": {} } ] }
        }"#;
        let document = parse_document(json);
        assert_eq!(document.end_index(), 5);
    }
}
