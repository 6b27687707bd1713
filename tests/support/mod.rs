#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway data directory for one test
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(key)
    }

    pub fn write_key(&self, key: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.key_path(key);
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_key(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_key("config.toml", contents)
    }

    /// Saved tasks as raw JSON values
    pub fn saved_tasks(&self) -> Vec<serde_json::Value> {
        self.read_key("todoTasks")
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

/// The binary pointed at `data`, with logging silenced
pub fn todo_cmd(data: &TestData) -> Command {
    let mut cmd = Command::cargo_bin("todo-alarm").expect("binary");
    cmd.arg("--data-dir").arg(data.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Parse the JSON envelope printed by a `--json` command
pub fn json_output(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(stdout);
    // Alarm events precede the envelope as single lines.
    let start = text.find("{\n").unwrap_or(0);
    serde_json::from_str(&text[start..]).expect("json envelope")
}
