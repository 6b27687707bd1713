//! Terminal implementations of the controller's Display and Notifier.

use std::io::Write;

use crate::controller::{Display, MessageLevel, Notifier, TaskView};
use crate::filter::{FilterMode, Summary};
use crate::format::{format_date, format_time, Reminder};
use crate::output::OutputOptions;
use crate::task::{Task, TaskRecord};

/// Owned copy of the last rendered view
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub filter: FilterMode,
    pub tasks: Vec<Task>,
    pub summary: Summary,
    pub empty_message: Option<&'static str>,
}

/// Keeps the latest view and the messages raised while a command ran.
///
/// One-shot commands print both at the end through the shared output layer.
/// In live mode (`watch`) messages go straight to stderr.
#[derive(Debug)]
pub struct TerminalDisplay {
    options: OutputOptions,
    live: bool,
    view: Option<RenderedView>,
    messages: Vec<(MessageLevel, String)>,
}

impl TerminalDisplay {
    pub fn new(options: OutputOptions) -> Self {
        Self {
            options,
            live: false,
            view: None,
            messages: Vec::new(),
        }
    }

    pub fn live(options: OutputOptions) -> Self {
        Self {
            live: true,
            ..Self::new(options)
        }
    }

    pub fn view(&self) -> Option<&RenderedView> {
        self.view.as_ref()
    }

    pub fn messages(&self) -> &[(MessageLevel, String)] {
        &self.messages
    }

    /// Error-level messages, in order
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|(level, _)| *level == MessageLevel::Error)
            .map(|(_, message)| message.as_str())
    }

    /// Most recent success message
    pub fn last_success(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|(level, _)| *level == MessageLevel::Success)
            .map(|(_, message)| message.as_str())
    }
}

impl Display for TerminalDisplay {
    fn render(&mut self, view: &TaskView<'_>) {
        self.view = Some(RenderedView {
            filter: view.filter,
            tasks: view.tasks.iter().map(|task| (*task).clone()).collect(),
            summary: view.summary,
            empty_message: view.empty_message(),
        });
    }

    fn show_message(&mut self, level: MessageLevel, message: &str) {
        if self.live && !self.options.quiet && !self.options.json {
            eprintln!("{message}");
        }
        self.messages.push((level, message.to_string()));
    }
}

/// Prints a reminder per fired alarm and rings the terminal bell.
#[derive(Debug)]
pub struct TerminalNotifier {
    options: OutputOptions,
    fired: Vec<Reminder>,
}

impl TerminalNotifier {
    pub fn new(options: OutputOptions) -> Self {
        Self {
            options,
            fired: Vec::new(),
        }
    }

    pub fn fired(&self) -> &[Reminder] {
        &self.fired
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, task: &Task) {
        let reminder = Reminder::for_task(task);
        if self.options.json {
            #[derive(serde::Serialize)]
            struct AlarmEvent<'a> {
                event: &'static str,
                task_id: u64,
                #[serde(flatten)]
                reminder: &'a Reminder,
            }
            let event = AlarmEvent {
                event: "alarm",
                task_id: task.id,
                reminder: &reminder,
            };
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
        } else {
            // The bell is the audio cue; the banner goes to stdout even when quiet.
            let mut stdout = std::io::stdout();
            let _ = writeln!(stdout, "\x07🔔 {}: {}", reminder.title, reminder.body);
            let _ = stdout.flush();
        }
        self.fired.push(reminder);
    }
}

/// One line per task for human output
pub fn format_task_line(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!("[{mark}] #{} {}", task.id, task.text);
    if let Some(schedule) = task.schedule.as_ref() {
        line.push_str(&format!(
            "  ({} at {}",
            format_date(schedule.due_date),
            format_time(schedule.due_time)
        ));
        if schedule.alarm_triggered() {
            line.push_str(", alarm fired");
        } else if schedule.has_alarm() {
            line.push_str(", alarm set");
        }
        line.push(')');
    }
    line
}

/// JSON shape of a task in command output
pub fn task_json(task: &Task) -> TaskRecord {
    TaskRecord::from(task)
}
