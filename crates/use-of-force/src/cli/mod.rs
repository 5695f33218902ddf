//! Command-line interface for use-of-force.
//!
//! This module provides the CLI structure and command handlers for the
//! `uof` binary.

mod commands;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub use commands::{
    parse_timestamp, CheckCommand, ClockArgs, ConfigCommand, DiffCommand, FormArg, MergeCommand,
    OverviewCommand, RemindersCommand, SanitiseCommand, SectionArg, ValidateCommand,
};

/// uof - Check, validate and review use of force reports
///
/// Runs the report engine over JSON documents: section status, form
/// validation, answer merging, edit diffs, statement reminders and the
/// reviewer's establishment overview.
#[derive(Debug, Parser)]
#[command(name = "uof")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the status of each report section
    Check(CheckCommand),

    /// Sanitise and validate form answers
    Validate(ValidateCommand),

    /// Show sanitised form answers
    Sanitise(SanitiseCommand),

    /// Merge section answers into a form response
    Merge(MergeCommand),

    /// Show answers that differ between two form responses
    Diff(DiffCommand),

    /// Claim statement reminders that are due
    Reminders(RemindersCommand),

    /// Show the reviewer's overview of an establishment
    Overview(OverviewCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Read a JSON document from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold the
/// expected JSON.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| Error::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Write `value` to `path` as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Render `value` as JSON text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}
