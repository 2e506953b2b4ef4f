//! Ordered, short-circuiting execution of external commands.
use crate::runner::{CommandSpec, Runner, StepResult};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, checked before each step starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub command: CommandSpec,
}

impl Step {
    pub fn new(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: String,
    steps: Vec<Step>,
}

/// A step that was attempted, paired with what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedStep {
    pub name: String,
    pub result: StepResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutcome {
    pub pipeline: String,
    pub total_steps: usize,
    pub steps: Vec<ExecutedStep>,
    pub cancelled: bool,
}

impl PipelineOutcome {
    /// True iff every step ran and exited zero.
    pub fn success(&self) -> bool {
        !self.cancelled
            && self.steps.len() == self.total_steps
            && self.steps.iter().all(|step| step.result.succeeded())
    }

    pub fn succeeded_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.result.succeeded())
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.total_steps.saturating_sub(self.steps.len())
    }

    pub fn failed_step(&self) -> Option<&ExecutedStep> {
        self.steps.iter().find(|step| !step.result.succeeded())
    }

    pub fn results(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().map(|step| &step.result)
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Build a pipeline whose steps are named by position (`step 1`, ...).
    pub fn from_commands<I>(name: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = CommandSpec>,
    {
        let steps = commands
            .into_iter()
            .enumerate()
            .map(|(idx, command)| Step::new(format!("step {}", idx + 1), command))
            .collect();
        Self::new(name, steps)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run steps in order, stopping at the first non-zero exit or when
    /// `cancel` is set. Steps after the stop point are never started.
    pub fn execute(&self, runner: &dyn Runner, cancel: &CancelToken) -> PipelineOutcome {
        let mut executed = Vec::with_capacity(self.steps.len());
        let mut cancelled = false;

        for (idx, step) in self.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(pipeline = %self.name, step = %step.name, "pipeline cancelled");
                cancelled = true;
                break;
            }
            tracing::info!(
                pipeline = %self.name,
                step = %step.name,
                index = idx + 1,
                total = self.steps.len(),
                command = %step.command,
                "running step"
            );
            let result = runner.run(&step.command);
            let failed = !result.succeeded();
            if failed {
                tracing::warn!(
                    pipeline = %self.name,
                    step = %step.name,
                    exit_code = result.exit_code,
                    elapsed_ms = result.duration_ms,
                    "step failed"
                );
            } else {
                tracing::debug!(
                    step = %step.name,
                    elapsed_ms = result.duration_ms,
                    "step succeeded"
                );
            }
            executed.push(ExecutedStep {
                name: step.name.clone(),
                result,
            });
            if failed {
                break;
            }
        }

        PipelineOutcome {
            pipeline: self.name.clone(),
            total_steps: self.steps.len(),
            steps: executed,
            cancelled,
        }
    }
}
