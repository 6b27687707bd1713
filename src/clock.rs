//! Wall-clock access.
//!
//! Due moments are local wall-clock times without a zone, so the clock hands
//! out the current time together with its UTC offset: the naive local part is
//! compared against schedules, the UTC part stamps `createdAt`.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current wall-clock time
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle and give the
/// other to a controller.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}
