//! Human-readable renderings of due dates and alarm reminders.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::task::Task;

pub const REMINDER_TITLE: &str = "Task Reminder";

/// `Sun, Oct 18, 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d, %Y").to_string()
}

/// 12-hour clock, `9:00 AM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Content of an alarm notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub title: &'static str,
    pub body: String,
    /// Stable per task, so repeated notifications replace each other
    pub tag: String,
}

impl Reminder {
    pub fn for_task(task: &Task) -> Self {
        Self {
            title: REMINDER_TITLE,
            body: format!("Time for: {}", task.text),
            tag: format!("task-{}", task.id),
        }
    }
}
