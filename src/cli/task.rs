//! todo-alarm command implementations.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::controller::TaskController;
use crate::error::{Error, Result};
use crate::filter::{FilterMode, Summary};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::persist::PersistenceAdapter;
use crate::storage::FileStore;
use crate::task::{ScheduleRequest, TaskId, TaskRecord};

use super::terminal::{format_task_line, task_json, TerminalDisplay, TerminalNotifier};

type Controller = TaskController<TerminalDisplay, TerminalNotifier>;

pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub options: OutputOptions,
}

impl Context {
    pub fn load(data_dir: PathBuf, options: OutputOptions) -> Self {
        let config = Config::load_from_dir(&data_dir);
        Self {
            data_dir,
            config,
            options,
        }
    }

    fn controller(&self, display: TerminalDisplay) -> Controller {
        let store = FileStore::new(&self.data_dir)
            .with_lock_timeout(self.config.storage.lock_timeout_ms);
        TaskController::new(
            PersistenceAdapter::new(store),
            SystemClock,
            display,
            TerminalNotifier::new(self.options),
        )
        .with_scan_interval(self.config.alarms.scan_interval())
    }

    /// Controller for a command that writes. Refuses to start over data it
    /// could not read, since the first save would replace it.
    fn writable_controller(&self) -> Result<Controller> {
        let controller = self.controller(TerminalDisplay::new(self.options));
        if controller.load_failed() {
            return Err(Error::OperationFailed(format!(
                "saved tasks in {} could not be loaded; refusing to overwrite them",
                self.data_dir.display()
            )));
        }
        Ok(controller)
    }
}

/// Fail the command if the last save did not reach storage
fn ensure_saved(controller: &Controller) -> Result<()> {
    if controller.is_degraded() {
        return Err(Error::OperationFailed(
            "tasks could not be saved; changes were not persisted".to_string(),
        ));
    }
    Ok(())
}

fn push_messages(human: &mut HumanOutput, controller: &Controller) {
    for message in controller.display().errors() {
        human.push_warning(message);
    }
}

pub struct AddOptions {
    pub text: String,
    pub schedule: bool,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub alarm: bool,
}

impl AddOptions {
    fn schedule_request(&self, config: &Config) -> Result<Option<ScheduleRequest>> {
        if self.schedule {
            let defaults =
                ScheduleRequest::defaults(SystemClock.now(), config.tasks.due_time()?, self.alarm);
            return Ok(Some(ScheduleRequest {
                date: self.date.or(defaults.date),
                time: self.time.or(defaults.time),
                alarm: self.alarm,
            }));
        }
        if self.date.is_some() || self.time.is_some() || self.alarm {
            return Ok(Some(ScheduleRequest {
                date: self.date,
                time: self.time,
                alarm: self.alarm,
            }));
        }
        Ok(None)
    }
}

#[derive(Serialize)]
struct TaskOutput {
    task: TaskRecord,
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let schedule = options.schedule_request(&ctx.config)?;
    let mut controller = ctx.writable_controller()?;
    let task = controller.add_task(&options.text, schedule)?;
    ensure_saved(&controller)?;

    let mut human = HumanOutput::new(
        controller
            .display()
            .last_success()
            .unwrap_or("Task added")
            .to_string(),
    );
    human.push_detail(format_task_line(&task));
    push_messages(&mut human, &controller);

    emit_success(
        ctx.options,
        "add",
        &TaskOutput {
            task: task_json(&task),
        },
        Some(&human),
    )
}

#[derive(Serialize)]
struct ListOutput {
    filter: FilterMode,
    summary: Summary,
    summary_text: String,
    tasks: Vec<TaskRecord>,
}

pub fn run_list(ctx: &Context, filter: Option<&str>) -> Result<()> {
    let mode = match filter {
        Some(raw) => raw.parse()?,
        None => ctx.config.tasks.filter()?,
    };
    let mut controller = ctx.controller(TerminalDisplay::new(ctx.options));
    controller.set_filter(mode);

    let view = controller
        .display()
        .view()
        .ok_or_else(|| Error::OperationFailed("nothing was rendered".to_string()))?;

    let mut human = HumanOutput::new(format!("Tasks ({})", view.filter));
    human.push_summary(view.summary.to_string(), "");
    match view.empty_message {
        Some(message) => human.push_detail(message),
        None => {
            for task in &view.tasks {
                human.push_detail(format_task_line(task));
            }
        }
    }
    push_messages(&mut human, &controller);

    let output = ListOutput {
        filter: view.filter,
        summary: view.summary,
        summary_text: view.summary.to_string(),
        tasks: view.tasks.iter().map(task_json).collect(),
    };
    emit_success(ctx.options, "list", &output, Some(&human))
}

#[derive(Serialize)]
struct ChangeOutput {
    id: TaskId,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<TaskRecord>,
}

pub fn run_toggle(ctx: &Context, id: TaskId) -> Result<()> {
    let mut controller = ctx.writable_controller()?;
    let changed = controller.toggle_task(id);
    ensure_saved(&controller)?;

    let task = controller.store().get(id);
    let header = match task {
        Some(task) if task.completed => format!("Task #{id} completed"),
        Some(_) => format!("Task #{id} reopened"),
        None => format!("No task #{id}"),
    };
    let mut human = HumanOutput::new(header);
    if let Some(task) = task {
        human.push_detail(format_task_line(task));
    }
    push_messages(&mut human, &controller);

    let output = ChangeOutput {
        id,
        changed,
        task: task.map(task_json),
    };
    emit_success(ctx.options, "toggle", &output, Some(&human))
}

pub fn run_remove(ctx: &Context, id: TaskId) -> Result<()> {
    let mut controller = ctx.writable_controller()?;
    let changed = controller.delete_task(id);
    ensure_saved(&controller)?;

    let header = if changed {
        format!("Task #{id} deleted")
    } else {
        format!("No task #{id}")
    };
    let mut human = HumanOutput::new(header);
    push_messages(&mut human, &controller);

    let output = ChangeOutput {
        id,
        changed,
        task: None,
    };
    emit_success(ctx.options, "remove", &output, Some(&human))
}

#[derive(Serialize)]
struct ClearOutput {
    removed: usize,
    remaining: usize,
}

pub fn run_clear_completed(ctx: &Context) -> Result<()> {
    let mut controller = ctx.writable_controller()?;
    let removed = controller.clear_completed();
    ensure_saved(&controller)?;

    let mut human = HumanOutput::new(
        controller
            .display()
            .last_success()
            .unwrap_or("Cleared completed tasks")
            .to_string(),
    );
    push_messages(&mut human, &controller);

    let output = ClearOutput {
        removed,
        remaining: controller.store().len(),
    };
    emit_success(ctx.options, "clear-completed", &output, Some(&human))
}

pub fn run_clear_all(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "clear-all deletes every task; pass --yes to confirm".to_string(),
        ));
    }
    let mut controller = ctx.writable_controller()?;
    let removed = controller.store().len();
    let cleared = controller.clear_all();
    if !cleared {
        return Err(Error::InvalidArgument("No tasks to clear!".to_string()));
    }
    ensure_saved(&controller)?;

    let mut human = HumanOutput::new(
        controller
            .display()
            .last_success()
            .unwrap_or("All tasks cleared")
            .to_string(),
    );
    push_messages(&mut human, &controller);

    let output = ClearOutput {
        removed,
        remaining: 0,
    };
    emit_success(ctx.options, "clear-all", &output, Some(&human))
}

#[derive(Serialize)]
struct CheckOutput {
    fired: Vec<TaskId>,
}

pub fn run_check(ctx: &Context) -> Result<()> {
    let mut controller = ctx.writable_controller()?;
    let fired = controller.check_alarms();
    ensure_saved(&controller)?;

    let mut human = HumanOutput::new("Alarm check");
    human.push_summary("Fired", fired.len().to_string());
    for reminder in controller.notifier().fired() {
        human.push_detail(format!("{}: {}", reminder.title, reminder.body));
    }
    push_messages(&mut human, &controller);

    emit_success(ctx.options, "check", &CheckOutput { fired }, Some(&human))
}

/// Scan on every tick until Ctrl-C.
///
/// Persisted state is re-read before each scan so tasks added by other
/// invocations are seen.
pub fn run_watch(ctx: &Context) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut controller = ctx.controller(TerminalDisplay::live(ctx.options));
        if controller.load_failed() {
            return Err(Error::OperationFailed(format!(
                "saved tasks in {} could not be loaded",
                ctx.data_dir.display()
            )));
        }
        controller.start_alarm_checker();
        if !ctx.options.quiet && !ctx.options.json {
            eprintln!(
                "Watching {} task(s) in {}; checking every {}s (Ctrl-C to stop)",
                controller.store().len(),
                ctx.data_dir.display(),
                ctx.config.alarms.scan_interval_secs
            );
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            let ticked = tokio::select! {
                ticked = controller.next_tick() => ticked,
                _ = &mut ctrl_c => false,
            };
            if !ticked {
                break;
            }
            if controller.reload() {
                controller.check_alarms();
            }
        }

        controller.stop_alarm_checker();
        Ok(())
    })
}
