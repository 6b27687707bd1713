//! Status filters and the task summary line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Active => "active",
            FilterMode::Completed => "completed",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !task.completed,
            FilterMode::Completed => task.completed,
        }
    }

    /// Text shown when the filtered view is empty
    pub fn empty_message(&self) -> &'static str {
        match self {
            FilterMode::All => "No tasks yet!",
            FilterMode::Active => "No active tasks!",
            FilterMode::Completed => "No completed tasks!",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "active" => Ok(FilterMode::Active),
            "completed" => Ok(FilterMode::Completed),
            other => Err(Error::InvalidArgument(format!(
                "unknown filter '{other}' (expected all, active or completed)"
            ))),
        }
    }
}

/// Tasks matching `mode`, in store order
pub fn filter(tasks: &[Task], mode: FilterMode) -> Vec<&Task> {
    tasks.iter().filter(|task| mode.matches(task)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub active: usize,
    pub total: usize,
}

pub fn count(tasks: &[Task]) -> Summary {
    Summary {
        active: tasks.iter().filter(|task| !task.completed).count(),
        total: tasks.len(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            f.write_str("No tasks")
        } else if self.active == 0 {
            f.write_str("All tasks completed!")
        } else {
            write!(f, "{} of {} tasks remaining", self.active, self.total)
        }
    }
}
