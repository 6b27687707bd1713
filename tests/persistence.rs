use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use todo_alarm::error::Error;
use todo_alarm::lock::FileLock;
use todo_alarm::persist::{PersistenceAdapter, COUNTER_KEY, TASKS_KEY};
use todo_alarm::storage::{FileStore, KeyValueStore};
use todo_alarm::task::{AlarmState, Schedule, Task};

fn sample_tasks() -> Vec<Task> {
    let created = Utc.with_ymd_and_hms(2026, 10, 17, 7, 12, 45).unwrap();
    vec![
        Task {
            id: 4,
            text: "Call the plumber".to_string(),
            completed: false,
            created_at: created,
            schedule: Some(Schedule {
                due_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                due_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
                alarm: AlarmState::Fired,
            }),
        },
        Task {
            id: 2,
            text: "Ünïcödé ✓".to_string(),
            completed: true,
            created_at: created,
            schedule: None,
        },
    ]
}

#[test]
fn file_store_round_trip_is_lossless() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let tasks = sample_tasks();

    let mut adapter = PersistenceAdapter::new(FileStore::new(dir.path()));
    adapter.save(&tasks, 5)?;

    // A fresh adapter sees exactly what was written.
    let adapter = PersistenceAdapter::new(FileStore::new(dir.path()));
    let snapshot = adapter.load()?.expect("snapshot");
    assert_eq!(snapshot.tasks, tasks);
    assert_eq!(snapshot.counter, Some(5));

    let raw = std::fs::read_to_string(dir.path().join(TASKS_KEY))?;
    assert!(raw.contains(r#""dueTime":"08:30""#));
    assert!(raw.contains(r#""alarmTriggered":true"#));
    assert!(!raw.contains("dueDate\":null"));
    assert_eq!(std::fs::read_to_string(dir.path().join(COUNTER_KEY))?, "5");
    Ok(())
}

#[test]
fn missing_data_dir_loads_as_nothing_saved() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let adapter = PersistenceAdapter::new(FileStore::new(dir.path().join("never-created")));

    assert!(adapter.load()?.is_none());
    assert!(!dir.path().join("never-created").exists());
    Ok(())
}

#[test]
fn save_creates_the_data_dir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("a").join("b");

    let mut adapter = PersistenceAdapter::new(FileStore::new(&nested));
    adapter.save(&[], 1)?;

    assert_eq!(std::fs::read_to_string(nested.join(TASKS_KEY))?, "[]");
    Ok(())
}

#[test]
fn held_lock_fails_the_save() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let _held = FileLock::acquire(dir.path().join("todoTasks.lock"), 1000)?;

    let mut adapter = PersistenceAdapter::new(FileStore::new(dir.path()).with_lock_timeout(50));
    let err = adapter.save(&sample_tasks(), 5).unwrap_err();

    assert!(matches!(err, Error::LockFailed(_)));
    assert!(err.is_persistence());
    assert!(!dir.path().join(TASKS_KEY).exists());
    Ok(())
}

#[test]
fn half_schedule_on_disk_is_corrupt() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut store = FileStore::new(dir.path());
    store.set(
        TASKS_KEY,
        r#"[{"id":1,"text":"x","completed":false,"createdAt":"2026-10-17T07:00:00Z","dueDate":"2026-10-20"}]"#,
    )?;

    let err = PersistenceAdapter::new(store).load().unwrap_err();
    assert!(matches!(err, Error::CorruptRecord(_)));
    Ok(())
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FileStore::new(dir.path());

    for key in ["", "../escape", "nested/key", ".hidden", "todoTasks.lock"] {
        assert!(store.set(key, "x").is_err(), "key {key:?} accepted");
    }
}
