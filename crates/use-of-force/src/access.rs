//! Role-based permissions.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::report::{Report, ReportStatus};
use crate::statement::Statement;

/// A user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Files reports and statements.
    Reporter,
    /// Manages submitted reports.
    Coordinator,
    /// Reviews reports at their establishment.
    Reviewer,
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Username.
    pub username: String,
    /// Establishment the user is working at.
    pub active_agency: String,
    /// Roles held.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    fn owns(&self, report: &Report) -> bool {
        self.username.eq_ignore_ascii_case(&report.reporter_username)
    }
}

/// Something a user may try to do to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the report.
    View,
    /// Change answers while the report is a draft.
    EditDraft,
    /// Change answers after submission.
    EditSubmitted,
    /// Delete the report.
    Delete,
    /// Add or remove involved staff.
    ManageInvolvedStaff,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::View => "view report",
            Self::EditDraft => "edit draft report",
            Self::EditSubmitted => "edit submitted report",
            Self::Delete => "delete report",
            Self::ManageInvolvedStaff => "manage involved staff",
        })
    }
}

/// Check whether `user` may perform `action` on `report`.
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] if not.
pub fn authorise(user: &User, action: Action, report: &Report) -> Result<()> {
    let allowed = match action {
        Action::View => {
            user.owns(report)
                || user.has_role(Role::Coordinator)
                || (user.has_role(Role::Reviewer) && user.active_agency == report.agency_id)
        }
        Action::EditDraft => user.owns(report) && report.status == ReportStatus::InProgress,
        Action::EditSubmitted | Action::Delete | Action::ManageInvolvedStaff => {
            user.has_role(Role::Coordinator)
        }
    };

    if allowed {
        Ok(())
    } else {
        debug!(user = %user.username, report_id = report.id, %action, "Permission denied");
        Err(Error::permission_denied(action.to_string()))
    }
}

/// Check whether `user` may write `statement`.
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] unless the statement is the user's own.
pub fn authorise_statement(user: &User, statement: &Statement) -> Result<()> {
    if user.username.eq_ignore_ascii_case(&statement.user_id) {
        Ok(())
    } else {
        debug!(user = %user.username, statement_id = statement.id, "Permission denied");
        Err(Error::permission_denied("write another user's statement"))
    }
}

/// Whether `user` may see the overview of `agency_id`.
#[must_use]
pub fn can_view_establishment(user: &User, agency_id: &str) -> bool {
    user.has_role(Role::Coordinator)
        || (user.has_role(Role::Reviewer) && user.active_agency == agency_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::ReminderPolicy;
    use chrono::Utc;

    fn user(username: &str, agency: &str, roles: &[Role]) -> User {
        User {
            username: username.to_string(),
            active_agency: agency.to_string(),
            roles: roles.to_vec(),
        }
    }

    fn report() -> Report {
        Report::new(1, 1, "MDI", "REPORTER", "Reporter")
    }

    #[test]
    fn test_view() {
        let r = report();
        assert!(authorise(&user("reporter", "LEI", &[]), Action::View, &r).is_ok());
        assert!(authorise(&user("C", "LEI", &[Role::Coordinator]), Action::View, &r).is_ok());
        assert!(authorise(&user("R", "MDI", &[Role::Reviewer]), Action::View, &r).is_ok());
        assert!(authorise(&user("R", "LEI", &[Role::Reviewer]), Action::View, &r).is_err());
        assert!(authorise(&user("OTHER", "MDI", &[Role::Reporter]), Action::View, &r).is_err());
    }

    #[test]
    fn test_edit_draft_only_by_owner_while_in_progress() {
        let mut r = report();
        let owner = user("REPORTER", "MDI", &[Role::Reporter]);
        assert!(authorise(&owner, Action::EditDraft, &r).is_ok());
        assert!(authorise(&user("C", "MDI", &[Role::Coordinator]), Action::EditDraft, &r).is_err());

        r.status = ReportStatus::Submitted;
        let err = authorise(&owner, Action::EditDraft, &r).unwrap_err();
        assert_eq!(err.to_string(), "permission denied: edit draft report");
    }

    #[test]
    fn test_coordinator_actions() {
        let r = report();
        let coordinator = user("C", "LEI", &[Role::Coordinator]);
        let reviewer = user("R", "MDI", &[Role::Reviewer]);
        for action in [Action::EditSubmitted, Action::Delete, Action::ManageInvolvedStaff] {
            assert!(authorise(&coordinator, action, &r).is_ok());
            assert!(authorise(&reviewer, action, &r).unwrap_err().is_permission_error());
        }
    }

    #[test]
    fn test_authorise_statement() {
        let statement = Statement::new(
            1,
            1,
            "MRS_JONES",
            "Jo Jones",
            ReminderPolicy::default().schedule(Utc::now()),
        );
        assert!(authorise_statement(&user("mrs_jones", "MDI", &[]), &statement).is_ok());
        assert!(authorise_statement(&user("C", "MDI", &[Role::Coordinator]), &statement).is_err());
    }

    #[test]
    fn test_can_view_establishment() {
        assert!(can_view_establishment(&user("C", "LEI", &[Role::Coordinator]), "MDI"));
        assert!(can_view_establishment(&user("R", "MDI", &[Role::Reviewer]), "MDI"));
        assert!(!can_view_establishment(&user("R", "LEI", &[Role::Reviewer]), "MDI"));
        assert!(!can_view_establishment(&user("P", "MDI", &[Role::Reporter]), "MDI"));
    }

    #[test]
    fn test_user_serde() {
        let user: User = serde_json::from_value(serde_json::json!({
            "username": "R",
            "activeAgency": "MDI",
            "roles": ["REVIEWER"]
        }))
        .unwrap();
        assert!(user.has_role(Role::Reviewer));
    }
}
