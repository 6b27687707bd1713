//! todo-alarm - task tracking with one-shot alarms
//!
//! The library holds the whole task model; the `todo-alarm` binary is a thin
//! terminal host around it.
//!
//! # Core Concepts
//!
//! - **Tasks**: short text items, newest first, with ids that are never reused
//! - **Schedules**: an optional due date and minute, optionally with an alarm
//! - **Alarms**: fire once, on the scan tick that lands in the due minute
//! - **Filters**: all, active or completed views over the same store
//!
//! # Module Organization
//!
//! - `task`: Task model, validation and the in-memory `TaskStore`
//! - `filter`: Filter modes and the summary line
//! - `alarm`: Alarm matching and the recurring scan ticker
//! - `persist`: Snapshot encoding onto the key-value surface
//! - `storage`: Key-value surface (file-backed and in-memory)
//! - `lock`: File locking and atomic writes
//! - `controller`: Orchestration and the Display/Notifier seams
//! - `clock`: Wall-clock access
//! - `format`: Date, time and reminder text
//! - `config`: Configuration loading from `config.toml`
//! - `output`: Shared human/JSON output for the CLI
//! - `cli`: Command-line host using clap
//! - `error`: Error types and result aliases

pub mod alarm;
pub mod cli;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod format;
pub mod lock;
pub mod output;
pub mod persist;
pub mod storage;
pub mod task;

pub use error::{Error, Result, ValidationError};
