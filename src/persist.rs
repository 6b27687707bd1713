//! Serializing the task store to the key-value surface.

use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::task::{Task, TaskId, TaskRecord};

/// Key holding the JSON array of task records
pub const TASKS_KEY: &str = "todoTasks";

/// Key holding the next id as a decimal string
pub const COUNTER_KEY: &str = "todoTaskIdCounter";

/// What `load` found in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    /// Persisted counter, if present and parseable. Advisory only.
    pub counter: Option<TaskId>,
}

pub struct PersistenceAdapter {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Write every task and the counter
    pub fn save(&mut self, tasks: &[Task], counter: TaskId) -> Result<()> {
        let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
        let json = serde_json::to_string(&records)?;
        self.store.set(TASKS_KEY, &json)?;
        self.store.set(COUNTER_KEY, &counter.to_string())?;
        debug!(tasks = tasks.len(), counter, "saved tasks");
        Ok(())
    }

    /// Read the last snapshot; `None` if nothing was ever saved.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let Some(raw) = self.store.get(TASKS_KEY)? else {
            return Ok(None);
        };
        let records: Vec<TaskRecord> = serde_json::from_str(&raw)?;
        let tasks = records
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>>>()?;

        let counter = match self.store.get(COUNTER_KEY)? {
            Some(raw) => match raw.trim().parse::<TaskId>() {
                Ok(counter) => Some(counter),
                Err(err) => {
                    warn!(value = %raw, error = %err, "ignoring unreadable task id counter");
                    None
                }
            },
            None => None,
        };

        debug!(tasks = tasks.len(), ?counter, "loaded tasks");
        Ok(Some(Snapshot { tasks, counter }))
    }
}
