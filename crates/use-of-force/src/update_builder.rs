//! Merge section answers into a report's form response.
//!
//! The form response is one JSON document keyed by section. When a page of
//! the wizard is saved, its sanitised answers replace that section wholesale.
//! Answers to dependent questions are kept only while the question they
//! depend on still has the triggering answer, so changing "Was a baton
//! drawn?" from yes to no also discards the stale "Was a baton used?" answer.

use serde_json::{Map, Value};
use tracing::debug;

use crate::forms::{self, SectionName};

/// Result of merging answers into a form response.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The answers match what is already stored.
    Unchanged,
    /// The updated form response.
    Updated(Value),
}

impl UpdateOutcome {
    /// Whether the form response changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// The updated form response, if it changed.
    #[must_use]
    pub fn into_updated(self) -> Option<Value> {
        match self {
            Self::Unchanged => None,
            Self::Updated(value) => Some(value),
        }
    }
}

/// Build a section's answers from sanitised input, in field order.
///
/// Fields the section does not declare, null answers, and dependent answers
/// whose dependency is unmet are dropped.
#[must_use]
pub fn section_answers(section: SectionName, input: &Value) -> Map<String, Value> {
    let empty = Map::new();
    let input = input.as_object().unwrap_or(&empty);

    let mut answers = Map::new();
    for field in forms::section(section).fields() {
        if let Some(dependency) = &field.dependent_on {
            if !dependency.is_satisfied(input) {
                continue;
            }
        }
        match input.get(&field.name) {
            None | Some(Value::Null) => {}
            Some(value) => {
                answers.insert(field.name.clone(), value.clone());
            }
        }
    }
    answers
}

/// Replace `section` of `form_object` with answers built from `input`.
///
/// Returns [`UpdateOutcome::Unchanged`] when the merged document equals the
/// original, so callers can skip persisting a no-op save.
#[must_use]
pub fn merge_into_payload(form_object: &Value, section: SectionName, input: &Value) -> UpdateOutcome {
    let answers = section_answers(section, input);

    let mut updated = match form_object {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    updated.insert(section.as_str().to_string(), Value::Object(answers));
    let updated = Value::Object(updated);

    if updated == *form_object {
        debug!(section = %section, "Section answers unchanged");
        UpdateOutcome::Unchanged
    } else {
        debug!(section = %section, "Section answers updated");
        UpdateOutcome::Updated(updated)
    }
}
