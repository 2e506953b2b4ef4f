//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Captured result of one `modverify` invocation.
#[derive(Debug)]
pub struct CliOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A scratch directory that `modverify` runs inside.
pub struct TestWorkspace {
    dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp workspace"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write_file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(&path, contents.as_bytes()).expect("write file");
        path
    }

    /// Write `modverify.json` so it is picked up without `--config`.
    pub fn write_config(&self, config: &serde_json::Value) -> PathBuf {
        let text = serde_json::to_string_pretty(config).expect("serialize config");
        self.write_file("modverify.json", &text)
    }

    /// Per-user config directory the binary sees; kept inside the workspace
    /// so a real `~/.config/modverify/config.json` never leaks into tests.
    pub fn user_config_dir(&self) -> PathBuf {
        self.join(".home/.config")
    }

    /// Run the built binary with the workspace as its working directory.
    pub fn run(&self, args: &[&str]) -> CliOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_modverify"))
            .args(args)
            .current_dir(self.path())
            .env_remove("MODVERIFY_LOG")
            .env("HOME", self.join(".home"))
            .env("XDG_CONFIG_HOME", self.user_config_dir())
            .stdin(Stdio::null())
            .output()
            .expect("spawn modverify");
        CliOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}
