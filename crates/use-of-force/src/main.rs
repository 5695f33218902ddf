//! `uof` - CLI for use-of-force
//!
//! This binary runs the report engine over JSON documents read from files.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use use_of_force::cli::{
    read_document, to_json, write_document, CheckCommand, Cli, Command, ConfigCommand,
    DiffCommand, MergeCommand, OverviewCommand, RemindersCommand, SanitiseCommand,
    ValidateCommand,
};
use use_of_force::edit_history::compare;
use use_of_force::forms::Form;
use use_of_force::reminders::{collect_due, ReminderPolicy};
use use_of_force::sanitiser::sanitise;
use use_of_force::validation::ValidationContext;
use use_of_force::{
    establishment, init_logging, merge_into_payload, process_input, Config, Error, Report,
    Statement, UpdateOutcome,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;
    let out = Output {
        pretty: config.output.pretty_json,
    };

    // Execute the command
    match cli.command {
        Command::Check(cmd) => handle_check(&cmd, out),
        Command::Validate(cmd) => handle_validate(&cmd, out),
        Command::Sanitise(cmd) => handle_sanitise(&cmd, out),
        Command::Merge(cmd) => handle_merge(&cmd, out),
        Command::Diff(cmd) => handle_diff(&cmd, out),
        Command::Reminders(cmd) => handle_reminders(&config, &cmd, out),
        Command::Overview(cmd) => handle_overview(&cmd, out),
        Command::Config(cmd) => handle_config(&config, cmd, out),
    }
}

#[derive(Debug, Clone, Copy)]
struct Output {
    pretty: bool,
}

impl Output {
    fn json<T: Serialize>(self, value: &T) -> anyhow::Result<()> {
        println!("{}", to_json(value, self.pretty)?);
        Ok(())
    }
}

fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    read_document(path).with_context(|| format!("failed to load {}", path.display()))
}

fn handle_check(cmd: &CheckCommand, out: Output) -> anyhow::Result<()> {
    let document: Value = load(&cmd.file)?;
    // Accept either a whole report or just its form response.
    let form = document.get("formResponse").unwrap_or(&document);
    let completion = use_of_force::check(form, cmd.clock.now());

    if cmd.json {
        return out.json(&completion);
    }
    for (section, status) in &completion.sections {
        println!("{:<24} {status}", section.title());
    }
    println!();
    if completion.complete {
        println!("Report is complete.");
    } else {
        println!(
            "Report is incomplete ({} of {} sections complete).",
            completion.sections.len() - completion.incomplete_sections().len(),
            completion.sections.len()
        );
    }
    Ok(())
}

fn handle_validate(cmd: &ValidateCommand, out: Output) -> anyhow::Result<()> {
    let input: Value = load(&cmd.input)?;
    let now = cmd.clock.now();
    let ctx = if cmd.partial {
        ValidationContext::partial(now)
    } else {
        ValidationContext::full(now)
    };
    let processed = process_input(Form::from(cmd.form).schema(), &input, &ctx);

    if cmd.json {
        out.json(&processed)?;
    } else if processed.is_valid() {
        println!("No errors.");
    } else {
        for error in &processed.errors {
            println!("{:<40} {}", error.href, error.text);
        }
    }

    if !processed.is_valid() {
        return Err(Error::validation(processed.errors).into());
    }
    Ok(())
}

fn handle_sanitise(cmd: &SanitiseCommand, out: Output) -> anyhow::Result<()> {
    let input: Value = load(&cmd.input)?;
    out.json(&sanitise(Form::from(cmd.form).schema(), &input))
}

fn handle_merge(cmd: &MergeCommand, out: Output) -> anyhow::Result<()> {
    let form: Value = load(&cmd.form)?;
    let input: Value = load(&cmd.input)?;
    let section = cmd.section.into();
    let answers = sanitise(Form::Section(section).schema(), &input);

    match merge_into_payload(&form, section, &answers) {
        UpdateOutcome::Unchanged => {
            println!("No change.");
            Ok(())
        }
        UpdateOutcome::Updated(updated) => out.json(&updated),
    }
}

fn handle_diff(cmd: &DiffCommand, out: Output) -> anyhow::Result<()> {
    let old: Value = load(&cmd.old)?;
    let new: Value = load(&cmd.new)?;
    let changes = compare(&old, &new);

    if cmd.json {
        return out.json(&changes);
    }
    if changes.is_empty() {
        println!("No changes.");
    }
    for change in &changes {
        let (from, to) = change.display();
        println!("{} / {}", change.section.title(), change.question);
        println!("  from: {from}");
        println!("  to:   {to}");
    }
    Ok(())
}

fn handle_reminders(config: &Config, cmd: &RemindersCommand, out: Output) -> anyhow::Result<()> {
    let mut statements: Vec<Statement> = load(&cmd.statements)?;
    let policy = ReminderPolicy::from(&config.reminders);
    let due = collect_due(&mut statements, cmd.clock.now(), &policy);

    if cmd.write {
        write_document(&cmd.statements, &statements).with_context(|| {
            format!("failed to update {}", cmd.statements.display())
        })?;
    }

    if cmd.json {
        return out.json(&due);
    }
    if due.is_empty() {
        println!("No reminders due.");
    }
    for reminder in &due {
        println!(
            "{:?}: statement {} for report {} ({}, {})",
            reminder.kind, reminder.statement_id, reminder.report_id, reminder.name, reminder.user_id
        );
    }
    Ok(())
}

fn handle_overview(cmd: &OverviewCommand, out: Output) -> anyhow::Result<()> {
    let reports: Vec<Report> = load(&cmd.reports)?;
    let statements: Vec<Statement> = load(&cmd.statements)?;
    let overview = establishment::build(&cmd.agency, &reports, &statements, cmd.clock.now());

    if cmd.json {
        return out.json(&overview);
    }
    for (heading, rows) in [
        ("Incomplete", &overview.incomplete),
        ("Complete", &overview.complete),
    ] {
        println!("{heading} ({})", rows.len());
        for row in rows {
            let date = row
                .incident_date
                .map_or_else(String::new, |d| d.format("%d/%m/%Y %H:%M").to_string());
            println!(
                "  #{:<6} {:<17} {:<24} {} pending, {} submitted{}",
                row.id,
                date,
                row.reporter_name,
                row.pending_statements,
                row.submitted_statements,
                if row.overdue { ", OVERDUE" } else { "" }
            );
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand, out: Output) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                out.json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Reminders]");
                println!(
                    "  First reminder after (hours): {}",
                    config.reminders.first_reminder_after_hours
                );
                println!(
                    "  Reminder interval (hours):    {}",
                    config.reminders.reminder_interval_hours
                );
                println!(
                    "  Overdue after (days):         {}",
                    config.reminders.overdue_after_days
                );
                println!();
                println!("[Output]");
                println!("  Pretty JSON:                  {}", config.output.pretty_json);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
