//! File locking and atomic writes for the task data directory
//!
//! A long-running `watch` host and short-lived commands may touch the same
//! key files. Every write goes through temp file + rename while holding an
//! `fs2` advisory lock on a sibling `<file>.lock`, and reads take the same
//! lock so they never observe a half-written value.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const LOCK_RETRY_INTERVAL_MS: u64 = 25;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // Windows reports sharing/lock violations as raw OS errors 32 and 33.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

/// Exclusive lock guard, released on drop
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock, waiting up to `timeout_ms`.
    ///
    /// The lock file is created if missing.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(e) if is_lock_contended(&e) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    std::thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Lock file guarding `path`
pub fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

/// Write `data` to `path` via a temp file in the same directory and a rename.
///
/// The temp name only carries the pid, so callers must hold the path's lock;
/// see [`write_atomic_locked`].
fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidArgument(format!("not a file path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp.{}", std::process::id()));

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Atomic write while holding `<path>.lock`
pub fn write_atomic_locked(path: impl AsRef<Path>, data: &[u8], timeout_ms: u64) -> Result<()> {
    let path = path.as_ref();
    let _lock = FileLock::acquire(lock_path_for(path), timeout_ms)?;
    write_atomic(path, data)
}

/// Read a UTF-8 file while holding `<path>.lock`. A missing file reads as `None`.
pub fn read_locked_str(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Option<String>> {
    let path = path.as_ref();
    let _lock = FileLock::acquire(lock_path_for(path), timeout_ms)?;

    match fs::read(path) {
        Ok(data) => String::from_utf8(data)
            .map(Some)
            .map_err(|e| Error::CorruptRecord(format!("{} is not UTF-8: {e}", path.display()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("todoTasks.lock");

        let held = FileLock::acquire(&lock_path, 1000).unwrap();
        let result = FileLock::acquire(&lock_path, 50);
        assert!(matches!(result, Err(Error::LockFailed(_))));

        drop(held);
        assert!(FileLock::acquire(&lock_path, 50).is_ok());
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todoTaskIdCounter");

        write_atomic(&path, b"4").unwrap();
        write_atomic(&path, b"5").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "5");
        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["todoTaskIdCounter"]);
    }

    #[test]
    fn locked_read_of_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todoTasks");
        assert_eq!(read_locked_str(&path, 1000).unwrap(), None);

        write_atomic_locked(&path, b"[]", 1000).unwrap();
        assert_eq!(read_locked_str(&path, 1000).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn concurrent_locked_writes_keep_one_whole_payload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todoTasks");

        let writers = 6;
        let barrier = Arc::new(Barrier::new(writers));
        let mut expected = Vec::with_capacity(writers);
        let mut handles = Vec::with_capacity(writers);
        for idx in 0..writers {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            let payload = format!("[{{\"id\":{idx},\"text\":\"{}\"}}]", "x".repeat(80));
            expected.push(payload.clone());
            handles.push(thread::spawn(move || {
                barrier.wait();
                write_atomic_locked(&path, payload.as_bytes(), 2000).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(expected.contains(&contents));
    }
}
