//! Staff statements.
//!
//! Every member of staff involved in a submitted report owes a statement.
//! Statements move from pending to submitted independently of the report and
//! can be amended afterwards with additional comments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::forms;
use crate::reminders::ReminderSchedule;
use crate::validation::{process_input, ValidationContext};

/// Status of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementStatus {
    /// Not yet submitted.
    Pending,
    /// Submitted by its author.
    Submitted,
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Submitted => write!(f, "SUBMITTED"),
        }
    }
}

/// Answers of a submitted statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementAnswers {
    /// Month of the last refresher training, 0 for January.
    pub last_training_month: u32,
    /// Year of the last refresher training.
    pub last_training_year: i32,
    /// Year the author joined the service.
    pub job_start_year: i32,
    /// The account itself.
    pub statement: String,
}

/// An additional comment added after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amendment {
    /// The comment.
    pub additional_comment: String,
    /// When the comment was added.
    pub date_submitted: DateTime<Utc>,
}

/// A staff member's statement about an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Statement identifier.
    pub id: u64,
    /// The report this statement belongs to.
    pub report_id: u64,
    /// Username of the author.
    pub user_id: String,
    /// Display name of the author.
    pub name: String,
    /// Current status.
    pub status: StatementStatus,
    /// Saved answers, complete once submitted.
    #[serde(default)]
    pub answers: Map<String, Value>,
    /// Whether the author has saved progress.
    #[serde(default)]
    pub in_progress: bool,
    /// When the statement was submitted.
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
    /// When the statement becomes overdue.
    pub overdue_date: DateTime<Utc>,
    /// When the next reminder is due, if any.
    #[serde(default)]
    pub next_reminder_date: Option<DateTime<Utc>>,
    /// Comments added after submission.
    #[serde(default)]
    pub amendments: Vec<Amendment>,
}

impl Statement {
    /// Create a pending statement.
    #[must_use]
    pub fn new(
        id: u64,
        report_id: u64,
        user_id: impl Into<String>,
        name: impl Into<String>,
        schedule: ReminderSchedule,
    ) -> Self {
        Self {
            id,
            report_id,
            user_id: user_id.into(),
            name: name.into(),
            status: StatementStatus::Pending,
            answers: Map::new(),
            in_progress: false,
            submitted_date: None,
            overdue_date: schedule.overdue_date,
            next_reminder_date: Some(schedule.next_reminder_date),
            amendments: Vec::new(),
        }
    }

    fn ensure_status(&self, expected: StatementStatus, action: &'static str) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(Error::invalid_transition("statement", self.status, action))
        }
    }

    /// Save answers without requiring every question to be answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement is already submitted or an answer
    /// given is invalid.
    pub fn save_progress(&mut self, input: &Value, now: DateTime<Utc>) -> Result<()> {
        self.ensure_status(StatementStatus::Pending, "save")?;
        let payload = process_input(forms::statement_schema(), input, &ValidationContext::partial(now))
            .into_result()?;

        self.answers = into_map(payload);
        self.in_progress = true;
        Ok(())
    }

    /// Submit the statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement is already submitted or the answers
    /// are incomplete or invalid.
    pub fn submit(&mut self, input: &Value, now: DateTime<Utc>) -> Result<()> {
        self.ensure_status(StatementStatus::Pending, "submit")?;
        let payload = process_input(forms::statement_schema(), input, &ValidationContext::full(now))
            .into_result()?;
        let answers: StatementAnswers = serde_json::from_value(payload)?;

        self.answers = into_map(serde_json::to_value(answers)?);
        self.status = StatementStatus::Submitted;
        self.submitted_date = Some(now);
        self.next_reminder_date = None;
        self.in_progress = false;
        info!(statement_id = self.id, report_id = self.report_id, "Statement submitted");
        Ok(())
    }

    /// The typed answers of a submitted statement.
    #[must_use]
    pub fn submitted_answers(&self) -> Option<StatementAnswers> {
        if self.status != StatementStatus::Submitted {
            return None;
        }
        serde_json::from_value(Value::Object(self.answers.clone())).ok()
    }

    /// Add a comment to a submitted statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement has not been submitted or the
    /// comment is blank or too long.
    pub fn add_amendment(&mut self, input: &Value, now: DateTime<Utc>) -> Result<&Amendment> {
        self.ensure_status(StatementStatus::Submitted, "amend")?;
        let payload = process_input(forms::amendment_schema(), input, &ValidationContext::full(now))
            .into_result()?;
        let additional_comment = payload
            .get("additionalComment")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::internal("validated amendment has no comment"))?
            .to_string();

        self.amendments.push(Amendment {
            additional_comment,
            date_submitted: now,
        });
        info!(statement_id = self.id, "Statement amended");
        self.amendments
            .last()
            .ok_or_else(|| Error::internal("amendment was not recorded"))
    }

    /// Whether the statement is still pending at or after its overdue date.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == StatementStatus::Pending && now >= self.overdue_date
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
