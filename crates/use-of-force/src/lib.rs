//! `use_of_force` - An engine for use of force incident reports
//!
//! This library validates, sanitises and merges the answers to the report
//! wizard, tracks section completeness, and manages the lifecycle of reports
//! and the staff statements they require.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod access;
pub mod cli;
pub mod config;
pub mod edit_history;
pub mod error;
pub mod establishment;
pub mod forms;
pub mod logging;
pub mod reminders;
pub mod report;
pub mod sanitiser;
pub mod schema;
pub mod statement;
pub mod status;
pub mod update_builder;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use forms::{Form, SectionName};
pub use logging::init_logging;
pub use report::{Report, ReportStatus};
pub use statement::{Statement, StatementStatus};
pub use status::{check, ReportCompletion, SectionStatus};
pub use update_builder::{merge_into_payload, UpdateOutcome};
pub use validation::{process_input, validate, ValidationContext, ValidationError};
