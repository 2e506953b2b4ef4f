//! Turn execution results into text and an exit code.
//!
//! Nothing here performs I/O; callers decide where the rendered text goes.
use crate::conformance::CheckResult;
use crate::doctor::{ToolCheck, ToolStatus};
use crate::pipeline::PipelineOutcome;
use crate::excerpt::OutputLimit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const NAME_COLUMN_WIDTH: usize = 25;
const STDOUT_LIMIT: OutputLimit = OutputLimit {
    lines: 40,
    bytes: 4096,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub exit_code: i32,
    pub text: String,
}

fn exit_code_for(success: bool) -> i32 {
    if success {
        0
    } else {
        1
    }
}

pub fn summarize_pipeline(outcome: &PipelineOutcome, show_output: bool) -> Summary {
    let mut text = String::new();
    let _ = writeln!(text, "=== Pipeline: {} ===", outcome.pipeline);

    for step in &outcome.steps {
        let result = &step.result;
        let _ = writeln!(text);
        let _ = writeln!(text, "--- [{}] Running: {} ---", step.name, result.command);
        if show_output && !result.stdout.is_empty() {
            let _ = writeln!(text, "STDOUT:");
            push_block(&mut text, &STDOUT_LIMIT.clip(&result.stdout));
        }
        if result.succeeded() {
            let _ = writeln!(text, "Success!");
        } else {
            if result.spawn_failed() {
                let _ = writeln!(text, "Failed (could not start command)");
            } else {
                let _ = writeln!(text, "Failed (exit {})", result.exit_code);
            }
            if !result.stderr.trim().is_empty() {
                let _ = writeln!(text, "Error:");
                push_block(&mut text, &result.stderr);
            }
        }
    }

    let _ = writeln!(text);
    if outcome.cancelled {
        let _ = writeln!(text, "Cancelled before step {}", outcome.steps.len() + 1);
    }
    let skipped = outcome.skipped_count();
    if skipped > 0 {
        let _ = writeln!(text, "Skipped {skipped} remaining step(s)");
    }
    let success = outcome.success();
    let _ = writeln!(
        text,
        "Result: {} ({}/{} steps succeeded)",
        if success { "PASSED" } else { "FAILED" },
        outcome.succeeded_count(),
        outcome.total_steps
    );

    Summary {
        exit_code: exit_code_for(success),
        text,
    }
}

pub fn summarize_checks(rule_set: &str, target: &Path, results: &[CheckResult]) -> Summary {
    let mut text = String::new();
    let _ = writeln!(text, "=== Conformance Results: {rule_set} ===");
    let _ = writeln!(text, "File: {}", target.display());
    let _ = writeln!(text);

    for result in results {
        let marker = if result.passed { "✅ PASS" } else { "❌ FAIL" };
        let _ = writeln!(
            text,
            "{:width$} {marker}",
            result.name,
            width = NAME_COLUMN_WIDTH
        );
    }

    let passed = results.iter().filter(|result| result.passed).count();
    let total = results.len();
    let success = passed == total;
    let _ = writeln!(text);
    if success {
        let _ = writeln!(text, "🎉 All checks satisfied!");
    } else {
        let _ = writeln!(text, "⚠️  Some checks not met");
    }
    let _ = writeln!(text, "Results: {passed}/{total} checks passed");

    Summary {
        exit_code: exit_code_for(success),
        text,
    }
}

pub fn summarize_tools(checks: &[ToolCheck]) -> Summary {
    let mut text = String::new();
    let _ = writeln!(text, "=== Toolchain ===");
    for check in checks {
        let status = match &check.status {
            ToolStatus::Found(path) => format!("✅ {}", path.display()),
            ToolStatus::Missing => "❌ not found on PATH".to_string(),
            ToolStatus::BuildProduct => "built by pipeline".to_string(),
            ToolStatus::Builtin => "shell builtin".to_string(),
            ToolStatus::Unparsed => "⚠️  could not parse command".to_string(),
        };
        let _ = writeln!(
            text,
            "{:width$} {status}  [{}]",
            check.program,
            check.used_by.join(", "),
            width = NAME_COLUMN_WIDTH
        );
    }
    let missing = checks.iter().filter(|check| check.status.is_missing()).count();
    let _ = writeln!(text);
    let _ = writeln!(text, "Missing: {missing}/{} programs", checks.len());
    Summary {
        exit_code: exit_code_for(missing == 0),
        text,
    }
}

#[derive(Debug, Serialize)]
struct PipelineReport<'a> {
    exit_code: i32,
    success: bool,
    #[serde(flatten)]
    outcome: &'a PipelineOutcome,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    exit_code: i32,
    rule_set: &'a str,
    target: &'a Path,
    passed: usize,
    total: usize,
    checks: &'a [CheckResult],
}

pub fn pipeline_json(outcome: &PipelineOutcome) -> Result<Summary> {
    let success = outcome.success();
    let exit_code = exit_code_for(success);
    let report = PipelineReport {
        exit_code,
        success,
        outcome,
    };
    let text = serde_json::to_string_pretty(&report).context("serialize pipeline report")?;
    Ok(Summary { exit_code, text })
}

pub fn checks_json(rule_set: &str, target: &Path, results: &[CheckResult]) -> Result<Summary> {
    let passed = results.iter().filter(|result| result.passed).count();
    let exit_code = exit_code_for(passed == results.len());
    let report = CheckReport {
        exit_code,
        rule_set,
        target,
        passed,
        total: results.len(),
        checks: results,
    };
    let text = serde_json::to_string_pretty(&report).context("serialize check report")?;
    Ok(Summary { exit_code, text })
}

fn push_block(text: &mut String, block: &str) {
    text.push_str(block);
    if !block.ends_with('\n') {
        text.push('\n');
    }
}
