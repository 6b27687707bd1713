//! Task controller: validation, mutation, persistence and collaborator calls.
//!
//! Every public mutation runs to completion (mutate, save, render) before
//! returning, so a host that serializes user events and scan ticks on one
//! thread never observes a half-applied change.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::alarm::{AlarmScanner, AlarmTicker, DEFAULT_SCAN_INTERVAL};
use crate::clock::Clock;
use crate::error::{Error, ValidationError};
use crate::filter::{self, FilterMode, Summary};
use crate::persist::PersistenceAdapter;
use crate::task::{ScheduleRequest, Task, TaskId, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Success,
    Error,
}

/// What the display receives after every change
#[derive(Debug, Clone)]
pub struct TaskView<'a> {
    pub filter: FilterMode,
    pub tasks: Vec<&'a Task>,
    pub summary: Summary,
}

impl TaskView<'_> {
    /// Empty-state text, if the filtered list is empty
    pub fn empty_message(&self) -> Option<&'static str> {
        self.tasks.is_empty().then(|| self.filter.empty_message())
    }
}

/// Renders task lists and transient messages
pub trait Display {
    fn render(&mut self, view: &TaskView<'_>);
    fn show_message(&mut self, level: MessageLevel, message: &str);
}

/// Receives one call per fired alarm
pub trait Notifier {
    fn notify(&mut self, task: &Task);
}

fn build_view(store: &TaskStore, mode: FilterMode) -> TaskView<'_> {
    TaskView {
        filter: mode,
        tasks: filter::filter(store.tasks(), mode),
        summary: filter::count(store.tasks()),
    }
}

pub struct TaskController<D: Display, N: Notifier> {
    store: TaskStore,
    persistence: PersistenceAdapter,
    clock: Box<dyn Clock>,
    display: D,
    notifier: N,
    filter: FilterMode,
    scanner: AlarmScanner,
    scan_interval: Duration,
    ticker: Option<AlarmTicker>,
    last_save_failed: bool,
    last_load_failed: bool,
}

impl<D: Display, N: Notifier> TaskController<D, N> {
    /// Load persisted state and render it.
    ///
    /// A failed load is reported and the controller starts with an empty store.
    pub fn new(
        persistence: PersistenceAdapter,
        clock: impl Clock + 'static,
        display: D,
        notifier: N,
    ) -> Self {
        let mut controller = Self {
            store: TaskStore::new(),
            persistence,
            clock: Box::new(clock),
            display,
            notifier,
            filter: FilterMode::default(),
            scanner: AlarmScanner,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            ticker: None,
            last_save_failed: false,
            last_load_failed: false,
        };
        if let Some(store) = controller.load_store() {
            controller.store = store;
        }
        controller.render();
        controller
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// True while the most recent save failed; in-memory state is unsaved.
    pub fn is_degraded(&self) -> bool {
        self.last_save_failed
    }

    /// True while the most recent load failed; persisted data was not read.
    pub fn load_failed(&self) -> bool {
        self.last_load_failed
    }

    pub fn view(&self) -> TaskView<'_> {
        build_view(&self.store, self.filter)
    }

    pub fn render(&mut self) {
        let view = build_view(&self.store, self.filter);
        self.display.render(&view);
    }

    pub fn add_task(
        &mut self,
        text: &str,
        schedule: Option<ScheduleRequest>,
    ) -> Result<Task, ValidationError> {
        let now = self.clock.now();
        let task = match self.store.add(text, schedule, now) {
            Ok(task) => task.clone(),
            Err(err) => {
                debug!(error = %err, "rejected task");
                self.display.show_message(MessageLevel::Error, &err.to_string());
                return Err(err);
            }
        };
        debug!(task_id = task.id, scheduled = task.schedule.is_some(), "added task");
        self.commit();
        self.display
            .show_message(MessageLevel::Success, "Task added successfully!");
        Ok(task)
    }

    /// Flip completion; unknown ids change nothing and save nothing.
    pub fn toggle_task(&mut self, id: TaskId) -> bool {
        let changed = self.store.toggle(id);
        if changed {
            debug!(task_id = id, "toggled task");
            self.commit();
        }
        changed
    }

    pub fn delete_task(&mut self, id: TaskId) -> bool {
        let removed = self.store.remove(id);
        if removed {
            debug!(task_id = id, "deleted task");
            self.commit();
        }
        removed
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
        self.render();
    }

    pub fn clear_completed(&mut self) -> usize {
        let removed = self.store.clear_completed();
        self.commit();
        self.display.show_message(
            MessageLevel::Success,
            &format!("Cleared {removed} completed tasks!"),
        );
        removed
    }

    /// Remove everything. Returns false, touching nothing, if already empty.
    pub fn clear_all(&mut self) -> bool {
        if self.store.is_empty() {
            self.display
                .show_message(MessageLevel::Error, "No tasks to clear!");
            return false;
        }
        self.store.clear_all();
        self.commit();
        self.display
            .show_message(MessageLevel::Success, "All tasks cleared!");
        true
    }

    /// One scan tick: fire due alarms, notify, save if anything fired.
    ///
    /// Returns the ids that fired on this tick. Skipped while the last load
    /// failed, since saving a fired alarm would replace the unread data.
    pub fn check_alarms(&mut self) -> Vec<TaskId> {
        if self.last_load_failed {
            debug!("skipping alarm scan; persisted tasks could not be read");
            return Vec::new();
        }
        let now = self.clock.now().naive_local();
        let fired = self.scanner.scan(&mut self.store, now);
        for id in &fired {
            if let Some(task) = self.store.get(*id) {
                self.notifier.notify(task);
            }
        }
        if !fired.is_empty() {
            self.commit();
        }
        fired
    }

    /// Re-read persisted state, keeping the current state if the read fails.
    pub fn reload(&mut self) -> bool {
        match self.load_store() {
            Some(store) => {
                self.store = store;
                self.render();
                true
            }
            None => false,
        }
    }

    /// Start the recurring scan timer. Must be called inside a tokio runtime.
    pub fn start_alarm_checker(&mut self) {
        if self.ticker.is_none() {
            debug!(period = ?self.scan_interval, "starting alarm checker");
            self.ticker = Some(AlarmTicker::start(self.scan_interval));
        }
    }

    pub fn stop_alarm_checker(&mut self) {
        if self.ticker.take().is_some() {
            debug!("stopped alarm checker");
        }
    }

    pub fn alarm_checker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Wait for the next scan tick. Returns false at once if the checker is stopped.
    pub async fn next_tick(&mut self) -> bool {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
                true
            }
            None => false,
        }
    }

    fn load_store(&mut self) -> Option<TaskStore> {
        let loaded = self
            .persistence
            .load()
            .and_then(|snapshot| match snapshot {
                Some(snapshot) => TaskStore::from_tasks(snapshot.tasks),
                None => Ok(TaskStore::new()),
            });
        self.last_load_failed = loaded.is_err();
        match loaded {
            Ok(store) => Some(store),
            Err(err) => {
                self.report_persistence_error("Error loading tasks!", &err);
                None
            }
        }
    }

    fn commit(&mut self) {
        self.save();
        self.render();
    }

    fn save(&mut self) {
        match self
            .persistence
            .save(self.store.tasks(), self.store.next_id())
        {
            Ok(()) => self.last_save_failed = false,
            Err(err) => {
                self.last_save_failed = true;
                self.report_persistence_error("Error saving tasks!", &err);
            }
        }
    }

    fn report_persistence_error(&mut self, message: &str, err: &Error) {
        warn!(error = %err, "{message}");
        self.display.show_message(MessageLevel::Error, message);
    }
}
