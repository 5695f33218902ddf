//! Statement reminder scheduling.
//!
//! When a report is submitted each involved staff member gets a pending
//! statement with a first reminder date and an overdue date. A poller claims
//! one due statement at a time, records that a reminder went out, and moves
//! the next reminder forward. Once the overdue point passes a final overdue
//! notice is due and no further reminders are scheduled.
//!
//! This module decides what is due. Delivering the reminder is up to the
//! caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ReminderConfig;
use crate::statement::{Statement, StatementStatus};

/// Timing of statement reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    /// Delay between report submission and the first reminder.
    pub first_after: Duration,
    /// Delay between reminders.
    pub interval: Duration,
    /// Delay between report submission and the statement becoming overdue.
    pub overdue_after: Duration,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self::from(&ReminderConfig::default())
    }
}

impl From<&ReminderConfig> for ReminderPolicy {
    fn from(config: &ReminderConfig) -> Self {
        Self {
            first_after: config.first_reminder_after(),
            interval: config.reminder_interval(),
            overdue_after: config.overdue_after(),
        }
    }
}

impl ReminderPolicy {
    /// Reminder dates for a statement requested at `submitted_at`.
    #[must_use]
    pub fn schedule(&self, submitted_at: DateTime<Utc>) -> ReminderSchedule {
        ReminderSchedule {
            next_reminder_date: submitted_at + self.first_after,
            overdue_date: submitted_at + self.overdue_after,
        }
    }
}

/// Reminder dates of a new statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSchedule {
    /// When the first reminder is due.
    pub next_reminder_date: DateTime<Utc>,
    /// When the statement becomes overdue.
    pub overdue_date: DateTime<Utc>,
}

/// Kind of notice due for a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderKind {
    /// A routine reminder.
    Reminder,
    /// The statement is overdue.
    Overdue,
}

/// A notice that should be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueReminder {
    /// The statement being chased.
    pub statement_id: u64,
    /// The report the statement belongs to.
    pub report_id: u64,
    /// Username of the statement's author.
    pub user_id: String,
    /// Display name of the statement's author.
    pub name: String,
    /// Kind of notice.
    pub kind: ReminderKind,
    /// When the statement is or was overdue.
    pub overdue_date: DateTime<Utc>,
}

fn is_claimable(statement: &Statement, now: DateTime<Utc>) -> bool {
    statement.status == StatementStatus::Pending
        && statement.next_reminder_date.is_some_and(|due| due <= now)
}

fn next_due_index(statements: &[Statement], now: DateTime<Utc>) -> Option<usize> {
    statements
        .iter()
        .enumerate()
        .filter(|(_, s)| is_claimable(s, now))
        .min_by_key(|(_, s)| (s.next_reminder_date, s.id))
        .map(|(i, _)| i)
}

/// The pending statement whose reminder has been due longest.
///
/// Ties go to the lowest statement id.
#[must_use]
pub fn next_due(statements: &[Statement], now: DateTime<Utc>) -> Option<&Statement> {
    next_due_index(statements, now).map(|i| &statements[i])
}

/// Record that a notice went out for `statement` at `now`.
///
/// At or after the overdue point the notice is [`ReminderKind::Overdue`] and
/// reminders stop. Otherwise the next reminder moves forward by whole
/// intervals until it is after `now`, and never past the overdue date.
pub fn record_sent(
    statement: &mut Statement,
    now: DateTime<Utc>,
    policy: &ReminderPolicy,
) -> ReminderKind {
    if now >= statement.overdue_date {
        statement.next_reminder_date = None;
        debug!(statement_id = statement.id, "Statement overdue, reminders stopped");
        return ReminderKind::Overdue;
    }

    let mut next = statement.next_reminder_date.unwrap_or(now);
    if policy.interval <= Duration::zero() {
        next = statement.overdue_date;
    }
    while next <= now {
        next += policy.interval;
    }
    statement.next_reminder_date = Some(next.min(statement.overdue_date));
    debug!(
        statement_id = statement.id,
        next = ?statement.next_reminder_date,
        "Reminder recorded"
    );
    ReminderKind::Reminder
}

/// Claim and record every reminder due at `now`, oldest first.
pub fn collect_due(
    statements: &mut [Statement],
    now: DateTime<Utc>,
    policy: &ReminderPolicy,
) -> Vec<DueReminder> {
    let mut due = Vec::new();
    while let Some(index) = next_due_index(statements, now) {
        let statement = &mut statements[index];
        let kind = record_sent(statement, now, policy);
        due.push(DueReminder {
            statement_id: statement.id,
            report_id: statement.report_id,
            user_id: statement.user_id.clone(),
            name: statement.name.clone(),
            kind,
            overdue_date: statement.overdue_date,
        });
    }

    if !due.is_empty() {
        info!(count = due.len(), "Collected due reminders");
    }
    due
}
