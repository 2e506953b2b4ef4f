use crate::runner::{CommandSpec, Runner, StepResult};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const DEFAULT_VERSION_PROGRAM: &str = "cmake";
pub const DEFAULT_VERSION_OUT: &str = "test.txt";

/// Run `<program> --version` and, if it succeeds, overwrite `out` with its
/// stdout verbatim. A failed query leaves `out` untouched.
pub fn capture_version(runner: &dyn Runner, program: &str, out: &Path) -> Result<StepResult> {
    let result = runner.run(&CommandSpec::argv([program, "--version"]));
    if result.succeeded() {
        fs::write(out, result.stdout.as_bytes())
            .with_context(|| format!("write {}", out.display()))?;
        tracing::info!(program, out = %out.display(), bytes = result.stdout.len(), "captured version");
    }
    Ok(result)
}
