// Builders for the interactive pieces: the consent link button, the document
// picker select menu, and the multi-field form modal. Custom ids embed the
// Discord user id so a component can only be driven by the user it was
// created for.

use std::time::{Duration, Instant};

use poise::serenity_prelude as serenity;

use crate::core::agent::FormDefinition;
use crate::core::docs::DocSummary;

const PICKER_PREFIX: &str = "docpicker:";
const FORM_OPEN_PREFIX: &str = "form-open:";
const FORM_SUBMIT_PREFIX: &str = "form-submit:";

/// Discord caps select menus at 25 options and labels at 100 characters.
const MAX_OPTIONS: usize = 25;
const MAX_LABEL_CHARS: usize = 100;

const PICKER_TTL: Duration = Duration::from_secs(120);
const FORM_TTL: Duration = Duration::from_secs(300);

/// A component waiting for its follow-up interaction.
pub struct PendingUi {
    pub kind: PendingKind,
    created: Instant,
}

pub enum PendingKind {
    Picker(Vec<DocSummary>),
    Form(FormDefinition),
}

impl PendingUi {
    pub fn picker(docs: Vec<DocSummary>) -> Self {
        Self {
            kind: PendingKind::Picker(docs),
            created: Instant::now(),
        }
    }

    pub fn form(form: FormDefinition) -> Self {
        Self {
            kind: PendingKind::Form(form),
            created: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        let ttl = match self.kind {
            PendingKind::Picker(_) => PICKER_TTL,
            PendingKind::Form(_) => FORM_TTL,
        };
        now.duration_since(self.created) > ttl
    }
}

pub fn picker_id(user_id: &str) -> String {
    format!("{PICKER_PREFIX}{user_id}")
}

pub fn form_open_id(user_id: &str) -> String {
    format!("{FORM_OPEN_PREFIX}{user_id}")
}

pub fn form_submit_id(user_id: &str) -> String {
    format!("{FORM_SUBMIT_PREFIX}{user_id}")
}

/// Extracts the owning user id from a component custom id, if it is ours.
pub fn user_from_custom_id(custom_id: &str) -> Option<&str> {
    custom_id
        .strip_prefix(PICKER_PREFIX)
        .or_else(|| custom_id.strip_prefix(FORM_OPEN_PREFIX))
        .or_else(|| custom_id.strip_prefix(FORM_SUBMIT_PREFIX))
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Row with a single link button to the Google consent page.
pub fn auth_link_row(consent_url: &str) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new_link(consent_url)
        .label("Connect Google Account")])
}

fn picker_options(docs: &[DocSummary]) -> Vec<serenity::CreateSelectMenuOption> {
    docs.iter()
        .take(MAX_OPTIONS)
        .map(|doc| {
            serenity::CreateSelectMenuOption::new(
                truncate_chars(&doc.name, MAX_LABEL_CHARS),
                doc.id.clone(),
            )
            .description(format!("Modified {}", doc.modified_date()))
        })
        .collect()
}

/// Select menu listing the user's documents.
pub fn picker_row(user_id: &str, docs: &[DocSummary]) -> serenity::CreateActionRow {
    let menu = serenity::CreateSelectMenu::new(
        picker_id(user_id),
        serenity::CreateSelectMenuKind::String {
            options: picker_options(docs),
        },
    )
    .placeholder("Choose a document…");
    serenity::CreateActionRow::SelectMenu(menu)
}

/// The same menu greyed out, swapped in after a selection.
pub fn disabled_picker_row(user_id: &str, docs: &[DocSummary]) -> serenity::CreateActionRow {
    let menu = serenity::CreateSelectMenu::new(
        picker_id(user_id),
        serenity::CreateSelectMenuKind::String {
            options: picker_options(docs),
        },
    )
    .placeholder("Document selected")
    .disabled(true);
    serenity::CreateActionRow::SelectMenu(menu)
}

/// Button that opens the form modal. Modals can only be sent in response to
/// an interaction, so the form is delivered in two steps: button, then modal.
pub fn form_button_row(user_id: &str) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(form_open_id(user_id))
        .label("Open Form")
        .style(serenity::ButtonStyle::Primary)
        .emoji('📝')])
}

/// Builds the modal for a form definition.
pub fn form_modal(user_id: &str, form: &FormDefinition) -> serenity::CreateModal {
    let rows: Vec<serenity::CreateActionRow> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let style = if field.long {
                serenity::InputTextStyle::Paragraph
            } else {
                serenity::InputTextStyle::Short
            };
            let mut input =
                serenity::CreateInputText::new(style, field.label.clone(), format!("field-{i}"))
                    .required(true);
            if !field.placeholder.is_empty() {
                input = input.placeholder(field.placeholder.clone());
            }
            serenity::CreateActionRow::InputText(input)
        })
        .collect();

    serenity::CreateModal::new(form_submit_id(user_id), form.title.clone()).components(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_round_trip() {
        assert_eq!(user_from_custom_id(&picker_id("42")), Some("42"));
        assert_eq!(user_from_custom_id(&form_open_id("42")), Some("42"));
        assert_eq!(user_from_custom_id(&form_submit_id("42")), Some("42"));
        assert_eq!(user_from_custom_id("something-else"), None);
    }

    #[test]
    fn picker_caps_at_discord_option_limit() {
        let docs: Vec<DocSummary> = (0..40)
            .map(|i| DocSummary {
                id: format!("doc-{i}"),
                name: format!("Document {i}"),
                modified: "2026-08-01T10:00:00Z".to_string(),
            })
            .collect();
        assert_eq!(picker_options(&docs).len(), MAX_OPTIONS);
    }

    #[test]
    fn long_names_are_truncated_for_labels() {
        let docs = vec![DocSummary {
            id: "a".to_string(),
            name: "x".repeat(300),
            modified: String::new(),
        }];
        // Just confirm the builder doesn't panic on oversize names.
        let _ = picker_options(&docs);
        assert_eq!(truncate_chars(&"x".repeat(300), MAX_LABEL_CHARS).len(), 100);
    }

    #[test]
    fn fresh_pending_ui_is_not_expired() {
        let pending = PendingUi::picker(vec![]);
        assert!(!pending.is_expired());

        let pending = PendingUi::form(FormDefinition {
            title: "New doc".to_string(),
            fields: vec![],
        });
        assert!(!pending.is_expired());
    }

    #[test]
    fn expiry_honours_the_per_kind_ttl() {
        let pending = PendingUi::picker(vec![]);
        let later = pending.created + PICKER_TTL + Duration::from_secs(1);
        assert!(pending.is_expired_at(later));

        let pending = PendingUi::form(FormDefinition {
            title: "t".to_string(),
            fields: vec![],
        });
        let after_picker_ttl = pending.created + PICKER_TTL + Duration::from_secs(1);
        assert!(!pending.is_expired_at(after_picker_ttl));
        let after_form_ttl = pending.created + FORM_TTL + Duration::from_secs(1);
        assert!(pending.is_expired_at(after_form_ttl));
    }
}
