//! Schemas of the statement and statement amendment forms.

use crate::schema::{Bound, ErrorCode, Sanitiser, Schema};

/// Earliest year accepted for training and joining dates.
const EARLIEST_YEAR: i32 = 1970;

/// Longest statement accepted, in characters.
const MAX_STATEMENT_LENGTH: i32 = 10_000;

pub(super) fn statement_schema() -> Schema {
    Schema::object([
        (
            "lastTrainingMonth",
            Schema::number()
                .integer()
                .required()
                .min(0)
                .max(11)
                .label("Month you last attended control and restraint refresher training")
                .message_all("Select the month you last attended refresher training"),
        ),
        (
            "lastTrainingYear",
            Schema::number()
                .integer()
                .required()
                .min(EARLIEST_YEAR)
                .max(Bound::CurrentYear)
                .label("Year you last attended control and restraint refresher training")
                .message_all("Enter the year you last attended refresher training")
                .message(ErrorCode::Min, "Enter a year that is 1970 or later")
                .message(ErrorCode::Max, "Enter a year that is not in the future"),
        ),
        (
            "jobStartYear",
            Schema::number()
                .integer()
                .required()
                .min(EARLIEST_YEAR)
                .max(Bound::Sibling("lastTrainingYear".to_string()))
                .label("Year you joined the prison service")
                .message_all("Enter the year you joined the prison service")
                .message(ErrorCode::Min, "Enter a year that is 1970 or later")
                .message(
                    ErrorCode::Max,
                    "Enter a year that is not after the year you last attended refresher training",
                ),
        ),
        (
            "statement",
            Schema::string()
                .required()
                .max(MAX_STATEMENT_LENGTH)
                .label("Your statement")
                .message_all("Enter your statement")
                .message(ErrorCode::Max, "Your statement must be 10,000 characters or fewer"),
        ),
    ])
}

pub(super) fn amendment_schema() -> Schema {
    Schema::object([(
        "additionalComment",
        Schema::string()
            .required()
            .max(MAX_STATEMENT_LENGTH)
            .sanitiser(Sanitiser::CollapseWhitespace)
            .label("Additional comment")
            .message_all("Enter your additional comment")
            .message(
                ErrorCode::Max,
                "Your additional comment must be 10,000 characters or fewer",
            ),
    )])
}
