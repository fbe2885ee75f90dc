// Form request tool.
//
// When the agent needs several pieces of input at once (say a title and a
// body for a new doc), it describes a form here; the Discord layer renders it
// as a modal behind an "Open Form" button. Discord's modal limits apply, so
// titles and labels are clamped to 45 chars, placeholders to 100, and at most
// five fields are kept.

use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::agent::{
    AgentTool, FormDefinition, FormField, PropertyDef, ToolDef, ToolOutput, ToolParameters,
    UiRequest,
};

const MAX_TITLE_LEN: usize = 45;
const MAX_LABEL_LEN: usize = 45;
const MAX_PLACEHOLDER_LEN: usize = 100;
const MAX_FIELDS: usize = 5;

#[derive(Debug, Deserialize)]
struct RequestFormArgs {
    title: String,
    fields: Vec<RequestedField>,
}

#[derive(Debug, Deserialize)]
struct RequestedField {
    label: String,
    #[serde(default)]
    placeholder: String,
    #[serde(default)]
    long: bool,
}

fn clamp(text: &str, max_len: usize) -> String {
    text.chars().take(max_len).collect()
}

pub struct RequestFormTool;

impl RequestFormTool {
    fn build_definition(args: RequestFormArgs) -> FormDefinition {
        FormDefinition {
            title: clamp(&args.title, MAX_TITLE_LEN),
            fields: args
                .fields
                .into_iter()
                .take(MAX_FIELDS)
                .map(|f| FormField {
                    label: clamp(&f.label, MAX_LABEL_LEN),
                    placeholder: clamp(&f.placeholder, MAX_PLACEHOLDER_LEN),
                    long: f.long,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl AgentTool for RequestFormTool {
    fn definition(&self) -> ToolDef {
        let mut properties = HashMap::new();
        properties.insert(
            "title".to_string(),
            PropertyDef::string("Title shown at the top of the form dialog (max 45 chars)"),
        );
        properties.insert(
            "fields".to_string(),
            PropertyDef {
                prop_type: "array".to_string(),
                description: "Fields to collect from the user, 1-5 items. Each item is an \
                              object with 'label' (max 45 chars), optional 'placeholder' \
                              (max 100 chars), and optional 'long' (true for a multi-line \
                              text area, e.g. a document body)."
                    .to_string(),
            },
        );
        ToolDef {
            name: "request_form".to_string(),
            description: "Send the user a Discord modal form to collect structured input. Use \
                          when you need several pieces of information at once, e.g. a document \
                          title and its body. Supports up to 5 fields. Set long=true for \
                          multi-line fields (document content, descriptions). After calling \
                          this tool, end your message by telling the user to click 'Open Form'."
                .to_string(),
            parameters: ToolParameters {
                properties,
                required: vec!["title".to_string(), "fields".to_string()],
            },
        }
    }

    async fn run(
        &self,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, Box<dyn Error + Send + Sync>> {
        let args: RequestFormArgs = serde_json::from_value(args.clone())?;
        if args.fields.is_empty() {
            return Err("request_form needs at least one field".into());
        }

        let form = Self::build_definition(args);
        let text = format!(
            "Form '{}' queued. The user will see an Open Form button.",
            form.title
        );
        Ok(ToolOutput::with_ui(text, UiRequest::Form(form)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn form_is_queued_as_ui() {
        let out = RequestFormTool
            .run(&json!({
                "title": "New document",
                "fields": [
                    {"label": "Title"},
                    {"label": "Body", "placeholder": "Full text", "long": true},
                ],
            }))
            .await
            .unwrap();

        match out.ui {
            Some(UiRequest::Form(form)) => {
                assert_eq!(form.title, "New document");
                assert_eq!(form.fields.len(), 2);
                assert!(form.fields[1].long);
            }
            other => panic!("expected a form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversize_input_is_clamped() {
        let long_title = "t".repeat(90);
        let long_placeholder = "p".repeat(300);
        let fields: Vec<_> = (0..8)
            .map(|i| json!({"label": format!("field {i}"), "placeholder": long_placeholder}))
            .collect();

        let out = RequestFormTool
            .run(&json!({"title": long_title, "fields": fields}))
            .await
            .unwrap();

        let Some(UiRequest::Form(form)) = out.ui else {
            panic!("expected a form");
        };
        assert_eq!(form.title.len(), MAX_TITLE_LEN);
        assert_eq!(form.fields.len(), MAX_FIELDS);
        assert!(form
            .fields
            .iter()
            .all(|f| f.placeholder.len() <= MAX_PLACEHOLDER_LEN));
    }

    #[tokio::test]
    async fn empty_field_list_is_rejected() {
        let err = RequestFormTool
            .run(&json!({"title": "x", "fields": []}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least one field"));
    }
}
