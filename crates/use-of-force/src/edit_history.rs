//! Coordinator edits of submitted reports.
//!
//! An edit records who changed what and why. Changes are computed field by
//! field between the stored form response and the edited one, following the
//! configured section and field order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::forms::{self, SectionName};
use crate::schema::{values_equal, Kind, Schema};
use crate::validation::{PathSegment, ValidationError};

/// Why a coordinator edited a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeReason {
    /// The report contained a mistake.
    ErrorInReport,
    /// The report left something out.
    SomethingMissing,
    /// New evidence came to light.
    NewEvidence,
    /// Some other reason, explained in the additional information.
    AnotherReason,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ErrorInReport => "Error in report",
            Self::SomethingMissing => "Something missing from report",
            Self::NewEvidence => "New evidence",
            Self::AnotherReason => "Another reason",
        })
    }
}

/// The reason given for an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReason {
    /// The selected reason.
    pub reason: ChangeReason,
    /// Free text explaining the reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl EditReason {
    /// Create a reason without additional information.
    #[must_use]
    pub fn new(reason: ChangeReason) -> Self {
        Self {
            reason,
            additional_info: None,
        }
    }

    /// Attach additional information.
    #[must_use]
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    /// Check that "another reason" is explained.
    ///
    /// # Errors
    ///
    /// Returns a validation error pointing at the additional information
    /// field if it is missing or blank.
    pub fn validate(&self) -> Result<()> {
        let explained = self
            .additional_info
            .as_deref()
            .is_some_and(|info| !info.trim().is_empty());
        if self.reason == ChangeReason::AnotherReason && !explained {
            return Err(Error::validation(vec![ValidationError::new(
                vec![PathSegment::Key("additionalInfo".to_string())],
                "Please specify the reason",
            )]));
        }
        Ok(())
    }
}

/// One answer that changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Section of the answer.
    pub section: SectionName,
    /// Field key.
    pub field: String,
    /// Question text.
    pub question: String,
    /// Previous answer, null if unanswered.
    pub old_value: Value,
    /// New answer, null if removed.
    pub new_value: Value,
}

/// A recorded edit of a submitted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEdit {
    /// The edited report.
    pub report_id: u64,
    /// Username of the coordinator.
    pub editor_username: String,
    /// When the edit was made.
    pub edited_at: DateTime<Utc>,
    /// Why the edit was made.
    pub reason: EditReason,
    /// What changed.
    pub changes: Vec<FieldChange>,
}

fn answer<'a>(section: Option<&'a Value>, field: &str) -> &'a Value {
    section.and_then(|s| s.get(field)).unwrap_or(&Value::Null)
}

/// Changed answers within one section.
#[must_use]
pub fn compare_section(
    name: SectionName,
    old: Option<&Value>,
    new: Option<&Value>,
) -> Vec<FieldChange> {
    forms::section(name)
        .fields()
        .iter()
        .filter_map(|field| {
            let old_value = answer(old, &field.name);
            let new_value = answer(new, &field.name);
            if values_equal(old_value, new_value) {
                return None;
            }
            Some(FieldChange {
                section: name,
                field: field.name.clone(),
                question: field.question.clone(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            })
        })
        .collect()
}

/// Changed answers between two form responses, in form order.
#[must_use]
pub fn compare(old_form: &Value, new_form: &Value) -> Vec<FieldChange> {
    SectionName::ALL
        .into_iter()
        .flat_map(|name| {
            compare_section(name, old_form.get(name.as_str()), new_form.get(name.as_str()))
        })
        .collect()
}

impl FieldChange {
    /// The previous and new answers rendered for people.
    #[must_use]
    pub fn display(&self) -> (String, String) {
        let schema = forms::section(self.section).schema().field(&self.field);
        (
            render(&self.old_value, schema),
            render(&self.new_value, schema),
        )
    }
}

/// Render an answer for people.
///
/// Booleans become "Yes"/"No" and lists are joined with commas. Objects in
/// a list show their values separated by spaces. Strings are shown as typed
/// unless they are one of the field's listed options, so `SEGREGATION_UNIT`
/// becomes "Segregation unit" but a username stays as it is.
#[must_use]
pub fn display_value(value: &Value, schema: &Schema) -> String {
    render(value, Some(schema))
}

fn render(value: &Value, schema: Option<&Schema>) -> String {
    let schema = schema.map(|s| s.conditional().map_or(s, |cond| &*cond.then));
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if schema.is_some_and(|sc| sc.allowed().contains(value)) => humanise(s),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let item = schema.and_then(|sc| match sc.kind() {
                Kind::Array(item) => Some(&**item),
                _ => None,
            });
            items
                .iter()
                .map(|v| render(v, item))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        }
        Value::Object(map) => map
            .iter()
            .map(|(key, v)| render(v, schema.and_then(|sc| sc.field(key))))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn humanise(s: &str) -> String {
    let lower = s.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
