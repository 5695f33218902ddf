//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand, ValueEnum};

use crate::forms::{Form, SectionName};
use crate::sanitiser::parse_date;

/// Parse a `--now` argument.
///
/// # Errors
///
/// Returns a message if the text is not a recognised date.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    parse_date(text).ok_or_else(|| format!("invalid date: {text}"))
}

/// Clock override shared by commands that depend on the current time.
#[derive(Debug, Clone, Args)]
pub struct ClockArgs {
    /// Evaluate as if it were this time (RFC 3339 or DD/MM/YYYY HH:MM)
    #[arg(long, value_name = "DATE", value_parser = parse_timestamp)]
    pub now: Option<DateTime<Utc>>,
}

impl ClockArgs {
    /// The overridden time, or the current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Report or form response document
    pub file: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

/// Validate command arguments.
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Form the input answers
    #[arg(short, long, value_enum)]
    pub form: FormArg,

    /// Allow unanswered questions, as when saving progress
    #[arg(long)]
    pub partial: bool,

    /// Raw answers document
    pub input: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

/// Sanitise command arguments.
#[derive(Debug, Args)]
pub struct SanitiseCommand {
    /// Form the input answers
    #[arg(short, long, value_enum)]
    pub form: FormArg,

    /// Raw answers document
    pub input: PathBuf,
}

/// Merge command arguments.
#[derive(Debug, Args)]
pub struct MergeCommand {
    /// Section the input answers
    #[arg(short, long, value_enum)]
    pub section: SectionArg,

    /// Current form response document
    pub form: PathBuf,

    /// Raw answers document
    pub input: PathBuf,
}

/// Diff command arguments.
#[derive(Debug, Args)]
pub struct DiffCommand {
    /// Form response before the edit
    pub old: PathBuf,

    /// Form response after the edit
    pub new: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Reminders command arguments.
#[derive(Debug, Args)]
pub struct RemindersCommand {
    /// Statements document (a JSON array)
    pub statements: PathBuf,

    /// Write the updated reminder dates back to the statements document
    #[arg(short, long)]
    pub write: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

/// Overview command arguments.
#[derive(Debug, Args)]
pub struct OverviewCommand {
    /// Establishment to summarise
    #[arg(short, long)]
    pub agency: String,

    /// Reports document (a JSON array)
    pub reports: PathBuf,

    /// Statements document (a JSON array)
    pub statements: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Report section argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    /// Incident details
    IncidentDetails,
    /// Use of force details
    UseOfForceDetails,
    /// Relocation and injuries
    RelocationAndInjuries,
    /// Evidence
    Evidence,
}

impl From<SectionArg> for SectionName {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::IncidentDetails => Self::IncidentDetails,
            SectionArg::UseOfForceDetails => Self::UseOfForceDetails,
            SectionArg::RelocationAndInjuries => Self::RelocationAndInjuries,
            SectionArg::Evidence => Self::Evidence,
        }
    }
}

/// Form argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormArg {
    /// Incident details section
    IncidentDetails,
    /// Use of force details section
    UseOfForceDetails,
    /// Relocation and injuries section
    RelocationAndInjuries,
    /// Evidence section
    Evidence,
    /// Staff statement
    Statement,
    /// Statement amendment
    Amendment,
}

impl From<FormArg> for Form {
    fn from(arg: FormArg) -> Self {
        match arg {
            FormArg::IncidentDetails => Self::Section(SectionName::IncidentDetails),
            FormArg::UseOfForceDetails => Self::Section(SectionName::UseOfForceDetails),
            FormArg::RelocationAndInjuries => Self::Section(SectionName::RelocationAndInjuries),
            FormArg::Evidence => Self::Section(SectionName::Evidence),
            FormArg::Statement => Self::Statement,
            FormArg::Amendment => Self::Amendment,
        }
    }
}
