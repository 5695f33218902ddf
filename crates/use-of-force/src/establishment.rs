//! The reviewer's overview of an establishment's submitted reports.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::report::{Report, ReportStatus};
use crate::statement::{Statement, StatementStatus};

/// One row of the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Report identifier.
    pub id: u64,
    /// Booking of the prisoner involved.
    pub booking_id: u64,
    /// Display name of the reporter.
    pub reporter_name: String,
    /// When the incident happened.
    pub incident_date: Option<DateTime<Utc>>,
    /// Report status.
    pub status: ReportStatus,
    /// Statements still outstanding.
    pub pending_statements: usize,
    /// Statements received.
    pub submitted_statements: usize,
    /// Whether any outstanding statement is overdue.
    pub overdue: bool,
}

/// Submitted and complete reports at one establishment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EstablishmentOverview {
    /// Reports awaiting statements, oldest incident first.
    pub incomplete: Vec<ReportSummary>,
    /// Complete reports, newest incident first.
    pub complete: Vec<ReportSummary>,
}

fn summarise(report: &Report, statements: &[Statement], now: DateTime<Utc>) -> ReportSummary {
    let own = || statements.iter().filter(|s| s.report_id == report.id);
    ReportSummary {
        id: report.id,
        booking_id: report.booking_id,
        reporter_name: report.reporter_name.clone(),
        incident_date: report.incident_date,
        status: report.status,
        pending_statements: own()
            .filter(|s| s.status == StatementStatus::Pending)
            .count(),
        submitted_statements: own()
            .filter(|s| s.status == StatementStatus::Submitted)
            .count(),
        overdue: own().any(|s| s.is_overdue(now)),
    }
}

/// Build the overview for `agency_id`.
///
/// Drafts, deleted reports and reports from other establishments are left
/// out.
#[must_use]
pub fn build(
    agency_id: &str,
    reports: &[Report],
    statements: &[Statement],
    now: DateTime<Utc>,
) -> EstablishmentOverview {
    let mut overview = EstablishmentOverview::default();

    for report in reports
        .iter()
        .filter(|r| !r.is_deleted() && r.agency_id == agency_id)
    {
        match report.status {
            ReportStatus::InProgress => {}
            ReportStatus::Submitted => overview
                .incomplete
                .push(summarise(report, statements, now)),
            ReportStatus::Complete => overview.complete.push(summarise(report, statements, now)),
        }
    }

    overview.incomplete.sort_by_key(|r| (r.incident_date, r.id));
    overview
        .complete
        .sort_by_key(|r| (Reverse(r.incident_date), r.id));

    debug!(
        agency_id,
        incomplete = overview.incomplete.len(),
        complete = overview.complete.len(),
        "Built establishment overview"
    );
    overview
}
