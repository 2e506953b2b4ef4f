//! External process execution.
//!
//! Every invocation yields exactly one [`StepResult`]. Launch failures are
//! folded into the result (sentinel exit code plus the OS error in stderr) so
//! callers only ever branch on data.
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

/// Exit code recorded when the child process could not be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// What to execute: a line handed to the platform shell, or a literal argv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandLine {
    Shell(String),
    Argv(Vec<String>),
}

/// One external command plus the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    line: CommandLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            line: CommandLine::Shell(line.into()),
            cwd: None,
        }
    }

    pub fn argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line: CommandLine::Argv(argv.into_iter().map(Into::into).collect()),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn line(&self) -> &CommandLine {
        &self.line
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Program name the command starts, if one can be determined.
    ///
    /// Shell lines are split with POSIX word rules; a line that fails to split
    /// (unbalanced quotes) has no program.
    pub fn program(&self) -> Option<String> {
        match &self.line {
            CommandLine::Argv(argv) => argv.first().cloned(),
            CommandLine::Shell(line) => shell_words::split(line)
                .ok()
                .and_then(|words| words.into_iter().next()),
        }
    }

    fn to_process(&self) -> Result<Command, String> {
        let mut cmd = match &self.line {
            CommandLine::Shell(line) => shell_command(line),
            CommandLine::Argv(argv) => {
                let (program, args) = argv
                    .split_first()
                    .ok_or_else(|| "empty argv".to_string())?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        };
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line {
            CommandLine::Shell(line) => f.write_str(line)?,
            CommandLine::Argv(argv) => f.write_str(&shell_words::join(argv))?,
        }
        if let Some(cwd) = &self.cwd {
            write!(f, " (in {})", cwd.display())?;
        }
        Ok(())
    }
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

/// Captured outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub command: CommandSpec,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// Set when the child never started; `exit_code` then holds the sentinel.
    pub spawn_error: bool,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn spawn_failed(&self) -> bool {
        self.spawn_error
    }

    fn spawn_failure(command: &CommandSpec, description: String, duration_ms: u64) -> Self {
        Self {
            command: command.clone(),
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: description,
            duration_ms,
            spawn_error: true,
        }
    }
}

/// Executes commands. Implementations must never panic or error on command
/// failure; everything is reported through the returned [`StepResult`].
pub trait Runner {
    fn run(&self, command: &CommandSpec) -> StepResult;
}

/// Runs commands as real child processes and waits for them to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> StepResult {
        let start = Instant::now();
        let mut process = match command.to_process() {
            Ok(process) => process,
            Err(reason) => {
                tracing::warn!(command = %command, %reason, "command not runnable");
                return StepResult::spawn_failure(command, reason, 0);
            }
        };

        tracing::debug!(command = %command, "spawn");
        let output = process.output();
        let duration_ms = start.elapsed().as_millis() as u64;

        match output {
            Ok(output) => {
                let exit_code = exit_code_of(&output.status);
                tracing::debug!(command = %command, exit_code, elapsed_ms = duration_ms, "exit");
                StepResult {
                    command: command.clone(),
                    exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    duration_ms,
                    spawn_error: false,
                }
            }
            Err(err) => {
                let program = command.program().unwrap_or_default();
                tracing::warn!(command = %command, error = %err, "spawn failed");
                StepResult::spawn_failure(
                    command,
                    format!("failed to spawn {program}: {err}"),
                    duration_ms,
                )
            }
        }
    }
}

#[cfg(unix)]
fn exit_code_of(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(SPAWN_FAILURE_EXIT_CODE)
}

#[cfg(not(unix))]
fn exit_code_of(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE)
}
