//! Preflight lookup of the programs pipelines depend on.
use crate::pipeline::Pipeline;
use crate::runner::CommandLine;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Found(PathBuf),
    Missing,
    /// A relative path such as `./json_demo`, produced by an earlier step.
    BuildProduct,
    /// Run by `sh` itself (`cd`, `export`, ...); never looked up.
    Builtin,
    /// The step's shell line could not be split into words.
    Unparsed,
}

impl ToolStatus {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    pub program: String,
    /// `pipeline/step` labels that invoke the program.
    pub used_by: Vec<String>,
    pub status: ToolStatus,
}

/// POSIX special and regular builtins that commonly lead a pipeline step.
const SHELL_BUILTINS: &[&str] = &[
    ".", ":", "[", "cd", "echo", "exit", "export", "false", "printf", "pwd", "read", "set",
    "shift", "source", "test", "true", "umask", "unset", "wait",
];

const COMMAND_SEPARATORS: &[&str] = &["&&", "||", "|", ";", "&"];

/// Resolve every distinct program started by `pipelines`, in first-use order.
pub fn check_tools(pipelines: &[Pipeline]) -> Vec<ToolCheck> {
    let mut checks: Vec<ToolCheck> = Vec::new();
    for pipeline in pipelines {
        for step in pipeline.steps() {
            let label = format!("{}/{}", pipeline.name(), step.name);
            let Some(programs) = invoked_programs(step.command.line()) else {
                record(&mut checks, step.command.to_string(), label, || {
                    ToolStatus::Unparsed
                });
                continue;
            };
            for program in programs {
                record(&mut checks, program.clone(), label.clone(), || {
                    resolve_program(&program)
                });
            }
        }
    }
    checks
}

fn record(
    checks: &mut Vec<ToolCheck>,
    program: String,
    label: String,
    resolve: impl FnOnce() -> ToolStatus,
) {
    if let Some(existing) = checks.iter_mut().find(|check| check.program == program) {
        if !existing.used_by.contains(&label) {
            existing.used_by.push(label);
        }
        return;
    }
    let status = resolve();
    tracing::debug!(program = %program, ?status, "resolved tool");
    checks.push(ToolCheck {
        program,
        used_by: vec![label],
        status,
    });
}

/// Programs a command starts: the argv head, or for shell lines the first
/// word of every `&&`/`||`/`;`/`|` segment after any `NAME=value` prefixes.
/// `None` when a shell line cannot be split into words.
fn invoked_programs(line: &CommandLine) -> Option<Vec<String>> {
    let words = match line {
        CommandLine::Argv(argv) => return Some(argv.first().cloned().into_iter().collect()),
        CommandLine::Shell(line) => shell_words::split(line).ok()?,
    };
    let mut programs = Vec::new();
    let mut expecting_program = true;
    for word in words {
        let (word, ends_segment) = match word.strip_suffix(';') {
            Some(head) => (head.to_string(), true),
            None => (word, false),
        };
        if COMMAND_SEPARATORS.contains(&word.as_str()) {
            expecting_program = true;
            continue;
        }
        if expecting_program && !word.is_empty() && !is_assignment(&word) {
            programs.push(word);
            expecting_program = false;
        }
        if ends_segment {
            expecting_program = true;
        }
    }
    Some(programs)
}

fn is_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    name.starts_with(|ch: char| ch == '_' || ch.is_ascii_alphabetic())
        && name.chars().all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}

fn resolve_program(program: &str) -> ToolStatus {
    if SHELL_BUILTINS.contains(&program) {
        return ToolStatus::Builtin;
    }
    let path = Path::new(program);
    if path.components().count() > 1 || path.is_absolute() {
        if path.is_relative() {
            return ToolStatus::BuildProduct;
        }
        return if path.is_file() {
            ToolStatus::Found(path.to_path_buf())
        } else {
            ToolStatus::Missing
        };
    }
    match which::which(program) {
        Ok(found) => ToolStatus::Found(found),
        Err(_) => ToolStatus::Missing,
    }
}
