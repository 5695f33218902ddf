//! Report section completeness.
//!
//! A section that has never been saved is not started. Once saved it is
//! complete only if its answers pass full validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::forms::{self, SectionName};
use crate::validation::{is_valid, ValidationContext};

/// Completion status of one report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionStatus {
    /// No answers saved.
    NotStarted,
    /// Answers saved but not yet valid.
    Incomplete,
    /// Answers pass full validation.
    Complete,
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Incomplete => write!(f, "INCOMPLETE"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// Status of every section plus overall completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCompletion {
    /// Section statuses, in wizard order.
    pub sections: Vec<(SectionName, SectionStatus)>,
    /// Whether every section is complete.
    pub complete: bool,
}

impl ReportCompletion {
    /// The status of one section.
    #[must_use]
    pub fn status(&self, name: SectionName) -> SectionStatus {
        self.sections
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(SectionStatus::NotStarted, |(_, s)| *s)
    }

    /// Sections that are not complete, in wizard order.
    #[must_use]
    pub fn incomplete_sections(&self) -> Vec<SectionName> {
        self.sections
            .iter()
            .filter(|(_, s)| *s != SectionStatus::Complete)
            .map(|(n, _)| *n)
            .collect()
    }
}

/// Status of one section's stored answers.
#[must_use]
pub fn section_status(name: SectionName, answers: Option<&Value>, now: DateTime<Utc>) -> SectionStatus {
    match answers {
        None | Some(Value::Null) => SectionStatus::NotStarted,
        Some(value) => {
            if is_valid(forms::section(name).schema(), value, &ValidationContext::full(now)) {
                SectionStatus::Complete
            } else {
                SectionStatus::Incomplete
            }
        }
    }
}

/// Check every section of a form response.
#[must_use]
pub fn check(form_response: &Value, now: DateTime<Utc>) -> ReportCompletion {
    let sections: Vec<(SectionName, SectionStatus)> = SectionName::ALL
        .into_iter()
        .map(|name| (name, section_status(name, form_response.get(name.as_str()), now)))
        .collect();
    let complete = sections.iter().all(|(_, s)| *s == SectionStatus::Complete);

    debug!(complete, "Checked report sections");
    ReportCompletion { sections, complete }
}
