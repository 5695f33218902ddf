//! Use of force reports and their lifecycle.
//!
//! A report starts in progress, is submitted by its reporter once every
//! section is complete, and becomes complete when every involved member of
//! staff has submitted their statement. Coordinators can edit, delete and
//! change the staff involved in a report after submission.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::edit_history::{compare_section, EditReason, ReportEdit};
use crate::error::{Error, Result};
use crate::forms::{self, SectionName};
use crate::reminders::ReminderPolicy;
use crate::sanitiser::parse_date;
use crate::statement::{Statement, StatementStatus};
use crate::status::{self, ReportCompletion};
use crate::update_builder::{merge_into_payload, UpdateOutcome};
use crate::validation::patterns;
use crate::validation::{process_input, PathSegment, ValidationContext, ValidationError};

/// Status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Being filled in by the reporter.
    InProgress,
    /// Submitted, awaiting statements.
    Submitted,
    /// Every statement is in.
    Complete,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// A member of staff who owes a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvolvedStaff {
    /// Username, upper-cased.
    pub username: String,
    /// Display name.
    pub name: String,
}

fn empty_form() -> Value {
    Value::Object(Map::new())
}

/// A use of force incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report identifier.
    pub id: u64,
    /// Booking of the prisoner involved.
    pub booking_id: u64,
    /// Establishment the incident happened at.
    pub agency_id: String,
    /// Username of the reporter.
    pub reporter_username: String,
    /// Display name of the reporter.
    pub reporter_name: String,
    /// When the incident happened, once answered.
    #[serde(default)]
    pub incident_date: Option<DateTime<Utc>>,
    /// Current status.
    pub status: ReportStatus,
    /// Answers, keyed by section.
    #[serde(default = "empty_form")]
    pub form_response: Value,
    /// When the report was submitted.
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
    /// When the report was deleted.
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
    /// Coordinator edits, oldest first.
    #[serde(default)]
    pub edits: Vec<ReportEdit>,
}

impl Report {
    /// Create an empty draft report.
    #[must_use]
    pub fn new(
        id: u64,
        booking_id: u64,
        agency_id: impl Into<String>,
        reporter_username: impl Into<String>,
        reporter_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            booking_id,
            agency_id: agency_id.into(),
            reporter_username: reporter_username.into(),
            reporter_name: reporter_name.into(),
            incident_date: None,
            status: ReportStatus::InProgress,
            form_response: empty_form(),
            submitted_date: None,
            deleted: None,
            edits: Vec::new(),
        }
    }

    /// Whether the report has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_deleted() {
            return Err(Error::not_found("report", self.id));
        }
        Ok(())
    }

    fn ensure_status(&self, allowed: &[ReportStatus], action: &'static str) -> Result<()> {
        self.ensure_live()?;
        if allowed.contains(&self.status) {
            return Ok(());
        }
        warn!(report_id = self.id, status = %self.status, action, "Rejected report transition");
        Err(Error::invalid_transition("report", self.status, action))
    }

    /// Section statuses of the report's answers.
    #[must_use]
    pub fn completion(&self, now: DateTime<Utc>) -> ReportCompletion {
        status::check(&self.form_response, now)
    }

    /// Save the answers to one section of a draft.
    ///
    /// Unanswered questions are allowed. Answers that are given must be
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not in progress or an answer is
    /// invalid.
    pub fn update_section(
        &mut self,
        section: SectionName,
        input: &Value,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        self.ensure_status(&[ReportStatus::InProgress], "update")?;
        let payload = process_input(
            forms::section(section).schema(),
            input,
            &ValidationContext::partial(now),
        )
        .into_result()?;

        let outcome = merge_into_payload(&self.form_response, section, &payload);
        if let UpdateOutcome::Updated(form) = &outcome {
            self.form_response = form.clone();
            self.refresh_incident_date();
        }
        Ok(outcome)
    }

    fn refresh_incident_date(&mut self) {
        self.incident_date = self
            .form_response
            .get(SectionName::IncidentDetails.as_str())
            .and_then(|s| s.get("incidentDate"))
            .and_then(Value::as_str)
            .and_then(parse_date);
    }

    fn involved_usernames(&self) -> Vec<String> {
        involved_usernames(&self.form_response)
    }

    /// Staff who owe a statement: the reporter first, then everyone named
    /// in the incident details, without duplicates.
    #[must_use]
    pub fn involved_staff(&self) -> Vec<InvolvedStaff> {
        let mut seen = HashSet::new();
        let reporter = InvolvedStaff {
            username: self.reporter_username.to_uppercase(),
            name: self.reporter_name.clone(),
        };

        std::iter::once(reporter)
            .chain(self.involved_usernames().into_iter().map(|username| {
                let username = username.to_uppercase();
                InvolvedStaff {
                    name: username.clone(),
                    username,
                }
            }))
            .filter(|staff| seen.insert(staff.username.clone()))
            .collect()
    }

    /// Submit a complete draft, creating a pending statement for each
    /// member of staff involved.
    ///
    /// Statement ids are allocated consecutively from `first_statement_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not in progress or any section is
    /// incomplete.
    pub fn submit(
        &mut self,
        now: DateTime<Utc>,
        policy: &ReminderPolicy,
        first_statement_id: u64,
    ) -> Result<Vec<Statement>> {
        self.ensure_status(&[ReportStatus::InProgress], "submit")?;

        let completion = self.completion(now);
        if !completion.complete {
            let sections: Vec<String> = completion
                .incomplete_sections()
                .into_iter()
                .map(|s| s.as_str().to_string())
                .collect();
            warn!(report_id = self.id, ?sections, "Rejected incomplete report");
            return Err(Error::ReportIncomplete { sections });
        }

        let schedule = policy.schedule(now);
        let statements: Vec<Statement> = self
            .involved_staff()
            .into_iter()
            .zip(first_statement_id..)
            .map(|(staff, id)| Statement::new(id, self.id, staff.username, staff.name, schedule))
            .collect();

        self.status = ReportStatus::Submitted;
        self.submitted_date = Some(now);
        info!(
            report_id = self.id,
            statements = statements.len(),
            "Report submitted"
        );
        Ok(statements)
    }

    /// Mark a submitted report complete once all its statements are in.
    ///
    /// Returns whether the report moved to complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is deleted or still in progress.
    pub fn complete_if_statements_submitted(&mut self, statements: &[Statement]) -> Result<bool> {
        self.ensure_status(&[ReportStatus::Submitted, ReportStatus::Complete], "complete")?;
        if self.status == ReportStatus::Complete {
            return Ok(false);
        }

        let all_submitted = statements
            .iter()
            .filter(|s| s.report_id == self.id)
            .all(|s| s.status == StatementStatus::Submitted);
        if all_submitted {
            self.status = ReportStatus::Complete;
            info!(report_id = self.id, "Report complete");
        }
        Ok(all_submitted)
    }

    /// Coordinator edit of a submitted report section.
    ///
    /// The edited section must pass full validation. Returns the recorded
    /// edit, or `None` if nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is a draft, the reason is incomplete,
    /// the answers are invalid, or the edit changes the staff involved. Use
    /// [`Report::add_involved_staff`] and [`Report::remove_involved_staff`]
    /// for those.
    pub fn edit_submitted(
        &mut self,
        section: SectionName,
        input: &Value,
        editor_username: &str,
        reason: EditReason,
        now: DateTime<Utc>,
    ) -> Result<Option<ReportEdit>> {
        self.ensure_status(&[ReportStatus::Submitted, ReportStatus::Complete], "edit")?;
        reason.validate()?;
        let payload = process_input(
            forms::section(section).schema(),
            input,
            &ValidationContext::full(now),
        )
        .into_result()?;

        let UpdateOutcome::Updated(form) = merge_into_payload(&self.form_response, section, &payload)
        else {
            return Ok(None);
        };
        if staff_set(&form) != staff_set(&self.form_response) {
            warn!(report_id = self.id, "Rejected edit of involved staff");
            return Err(Error::validation(vec![ValidationError::new(
                vec![PathSegment::Key("involvedStaff".to_string())],
                "Staff must be added or removed individually so their statements are kept in step",
            )]));
        }
        let changes = compare_section(
            section,
            self.form_response.get(section.as_str()),
            form.get(section.as_str()),
        );
        self.form_response = form;
        self.refresh_incident_date();
        if changes.is_empty() {
            return Ok(None);
        }

        let edit = ReportEdit {
            report_id: self.id,
            editor_username: editor_username.to_string(),
            edited_at: now,
            reason,
            changes,
        };
        info!(
            report_id = self.id,
            editor = editor_username,
            changes = edit.changes.len(),
            "Report edited"
        );
        self.edits.push(edit.clone());
        Ok(Some(edit))
    }

    /// Soft delete the report.
    ///
    /// Reminders stop for the report's pending statements.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is already deleted.
    pub fn delete(&mut self, statements: &mut [Statement], now: DateTime<Utc>) -> Result<()> {
        if self.is_deleted() {
            warn!(report_id = self.id, "Report already deleted");
            return Err(Error::invalid_transition("report", "DELETED", "delete"));
        }
        self.deleted = Some(now);
        let mut stopped = 0;
        for statement in statements.iter_mut().filter(|s| s.report_id == self.id) {
            if statement.next_reminder_date.take().is_some() {
                stopped += 1;
            }
        }
        info!(report_id = self.id, reminders_stopped = stopped, "Report deleted");
        Ok(())
    }

    fn involved_staff_mut(&mut self) -> Option<&mut Vec<Value>> {
        if !self.form_response.is_object() {
            self.form_response = empty_form();
        }
        let details = self
            .form_response
            .as_object_mut()?
            .entry(SectionName::IncidentDetails.as_str())
            .or_insert_with(empty_form);
        details
            .as_object_mut()?
            .entry("involvedStaff")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
    }

    /// Add a member of staff to a submitted report and request their
    /// statement.
    ///
    /// A complete report goes back to submitted until the new statement is
    /// in.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is a draft, the username is invalid, or
    /// the staff member is already involved.
    pub fn add_involved_staff(
        &mut self,
        statements: &mut Vec<Statement>,
        staff: InvolvedStaff,
        statement_id: u64,
        now: DateTime<Utc>,
        policy: &ReminderPolicy,
    ) -> Result<()> {
        self.ensure_status(
            &[ReportStatus::Submitted, ReportStatus::Complete],
            "add staff to",
        )?;
        let username = staff.username.trim().to_uppercase();
        let username_path = vec![PathSegment::Key("username".to_string())];

        if !patterns::username().matches(&username) {
            return Err(Error::validation(vec![ValidationError::new(
                username_path,
                "Usernames may only contain letters, numbers and underscores",
            )]));
        }
        if statements
            .iter()
            .any(|s| s.report_id == self.id && s.user_id.eq_ignore_ascii_case(&username))
        {
            return Err(Error::validation(vec![ValidationError::new(
                username_path,
                "This staff member has already been added",
            )]));
        }

        let involved = self
            .involved_staff_mut()
            .ok_or_else(|| Error::internal("incident details are not an object"))?;
        involved.push(json!({ "username": username }));

        statements.push(Statement::new(
            statement_id,
            self.id,
            username.clone(),
            staff.name,
            policy.schedule(now),
        ));
        if self.status == ReportStatus::Complete {
            self.status = ReportStatus::Submitted;
        }
        info!(report_id = self.id, username = %username, "Involved staff added");
        Ok(())
    }

    /// Remove a member of staff from a submitted report along with their
    /// statement, then re-check whether the report is complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is a draft, the staff member is the
    /// reporter, or they are not involved.
    pub fn remove_involved_staff(
        &mut self,
        statements: &mut Vec<Statement>,
        username: &str,
    ) -> Result<()> {
        self.ensure_status(
            &[ReportStatus::Submitted, ReportStatus::Complete],
            "remove staff from",
        )?;
        if self.reporter_username.eq_ignore_ascii_case(username) {
            return Err(Error::permission_denied("remove the reporter from their own report"));
        }

        let index = statements
            .iter()
            .position(|s| s.report_id == self.id && s.user_id.eq_ignore_ascii_case(username))
            .ok_or_else(|| Error::not_found("statement", username))?;
        statements.remove(index);

        if let Some(involved) = self.involved_staff_mut() {
            involved.retain(|s| {
                !s.get("username")
                    .and_then(Value::as_str)
                    .is_some_and(|u| u.eq_ignore_ascii_case(username))
            });
        }
        info!(report_id = self.id, username, "Involved staff removed");

        self.complete_if_statements_submitted(statements)?;
        Ok(())
    }
}

fn involved_usernames(form: &Value) -> Vec<String> {
    form.get(SectionName::IncidentDetails.as_str())
        .and_then(|s| s.get("involvedStaff"))
        .and_then(Value::as_array)
        .map(|staff| {
            staff
                .iter()
                .filter_map(|s| s.get("username").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn staff_set(form: &Value) -> BTreeSet<String> {
    involved_usernames(form)
        .iter()
        .map(|u| u.to_uppercase())
        .collect()
}
