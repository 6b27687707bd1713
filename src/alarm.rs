//! Alarm matching and the recurring scan tick.
//!
//! A scan compares every armed task's due minute with the current wall-clock
//! minute. There is no catch-up: a minute that no tick lands on is never
//! matched, so a skipped tick (sleep, clock jump) means that alarm stays
//! armed but never fires.

use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::task::{Task, TaskId, TaskStore};

/// Reference scan period
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

fn truncate_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Whether `task` fires at wall-clock `now`
pub fn is_due(task: &Task, now: NaiveDateTime) -> bool {
    let Some(schedule) = task.schedule.as_ref() else {
        return false;
    };
    schedule.has_alarm()
        && !schedule.alarm_triggered()
        && !task.completed
        && schedule.due() == truncate_to_minute(now)
}

/// One scan pass over the store
#[derive(Debug, Default, Clone, Copy)]
pub struct AlarmScanner;

impl AlarmScanner {
    /// Fire every task due at `now`, returning the ids that fired.
    ///
    /// Each returned task is already marked triggered, so a second scan in
    /// the same minute returns nothing.
    pub fn scan(&self, store: &mut TaskStore, now: NaiveDateTime) -> Vec<TaskId> {
        let mut fired = Vec::new();
        for task in store.tasks_mut() {
            if !is_due(task, now) {
                continue;
            }
            if let Some(schedule) = task.schedule.as_mut() {
                if schedule.fire() {
                    info!(task_id = task.id, text = %task.text, "alarm fired");
                    fired.push(task.id);
                }
            }
        }
        debug!(at = %now, fired = fired.len(), "alarm scan");
        fired
    }
}

/// Recurring scan timer.
///
/// The first tick comes one full period after start. Ticks missed while the
/// host was busy are skipped, not replayed. Must be created inside a tokio
/// runtime.
#[derive(Debug)]
pub struct AlarmTicker {
    interval: Interval,
}

impl AlarmTicker {
    /// # Panics
    /// If `period` is zero.
    pub fn start(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ScheduleRequest;
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 7, 4, h, m, s)
            .unwrap()
    }

    fn store_with(alarm: bool, due: (u32, u32)) -> TaskStore {
        let mut store = TaskStore::new();
        let request = ScheduleRequest {
            date: NaiveDate::from_ymd_opt(2026, 7, 4),
            time: NaiveTime::from_hms_opt(due.0, due.1, 0),
            alarm,
        };
        store.add("fireworks", Some(request), at(8, 0, 0)).unwrap();
        store
    }

    #[test]
    fn fires_once_within_the_due_minute() {
        let mut store = store_with(true, (21, 30));
        let scanner = AlarmScanner;

        assert!(scanner.scan(&mut store, at(21, 29, 59).naive_local()).is_empty());
        assert_eq!(scanner.scan(&mut store, at(21, 30, 12).naive_local()), vec![1]);
        assert!(store.tasks()[0].schedule.unwrap().alarm_triggered());
        assert!(scanner.scan(&mut store, at(21, 30, 48).naive_local()).is_empty());
    }

    #[test]
    fn never_fires_without_alarm() {
        let mut store = store_with(false, (21, 30));
        assert!(AlarmScanner
            .scan(&mut store, at(21, 30, 0).naive_local())
            .is_empty());
        assert!(!store.tasks()[0].schedule.unwrap().alarm_triggered());
    }

    #[test]
    fn completed_tasks_stay_armed_and_silent() {
        let mut store = store_with(true, (21, 30));
        store.toggle(1);
        assert!(AlarmScanner
            .scan(&mut store, at(21, 30, 0).naive_local())
            .is_empty());
        assert!(store.tasks()[0].schedule.unwrap().has_alarm());
        assert!(!store.tasks()[0].schedule.unwrap().alarm_triggered());
    }

    #[test]
    fn skipped_minute_never_fires() {
        let mut store = store_with(true, (21, 30));
        assert!(AlarmScanner
            .scan(&mut store, at(21, 31, 0).naive_local())
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_waits_a_full_period() {
        let start = Instant::now();
        let mut ticker = AlarmTicker::start(Duration::from_secs(60));
        assert_eq!(ticker.period(), Duration::from_secs(60));

        ticker.tick().await;
        let first = start.elapsed();
        assert!(first >= Duration::from_secs(60) && first < Duration::from_secs(61));
        ticker.tick().await;
        let second = start.elapsed();
        assert!(second >= Duration::from_secs(120) && second < Duration::from_secs(121));
    }
}
