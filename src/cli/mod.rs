//! Command-line interface for todo-alarm
//!
//! This module defines the CLI structure using clap derive macros. The
//! commands drive a [`TaskController`](crate::controller::TaskController)
//! wired to the terminal collaborators in `terminal`.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::output::OutputOptions;

mod task;
mod terminal;

pub use terminal::{TerminalDisplay, TerminalNotifier};

/// todo-alarm - local tasks with due dates and one-shot alarms
#[derive(Parser, Debug)]
#[command(name = "todo-alarm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the task data and config.toml
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task text (at most 100 characters)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Schedule the task, filling a missing date with tomorrow and a
        /// missing time with the configured default
        #[arg(long)]
        schedule: bool,

        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Due time (HH:MM, 24-hour)
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,

        /// Raise an alarm when the due minute arrives
        #[arg(long)]
        alarm: bool,
    },

    /// List tasks
    List {
        /// Filter: all, active, completed
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Mark a task complete, or undo completion
    Toggle {
        /// Task id
        id: u64,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Remove {
        /// Task id
        id: u64,
    },

    /// Delete all completed tasks
    ClearCompleted,

    /// Delete every task and restart ids at 1
    ClearAll {
        /// Confirm deleting every task
        #[arg(long)]
        yes: bool,
    },

    /// Run one alarm scan now
    Check,

    /// Scan for due alarms until interrupted
    Watch,
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn parse_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|err| format!("expected HH:MM: {err}"))
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        let options = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let data_dir = self.data_dir.unwrap_or_else(crate::config::default_data_dir);
        let ctx = task::Context::load(data_dir, options);

        match self.command {
            Commands::Add {
                text,
                schedule,
                date,
                time,
                alarm,
            } => task::run_add(
                &ctx,
                task::AddOptions {
                    text: text.join(" "),
                    schedule,
                    date,
                    time,
                    alarm,
                },
            ),
            Commands::List { filter } => task::run_list(&ctx, filter.as_deref()),
            Commands::Toggle { id } => task::run_toggle(&ctx, id),
            Commands::Remove { id } => task::run_remove(&ctx, id),
            Commands::ClearCompleted => task::run_clear_completed(&ctx),
            Commands::ClearAll { yes } => task::run_clear_all(&ctx, yes),
            Commands::Check => task::run_check(&ctx),
            Commands::Watch => task::run_watch(&ctx),
        }
    }
}
