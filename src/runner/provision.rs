//! Fail-fast provisioning run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::ProvisionConfig;
use crate::error::SetupError;
use crate::shell::CommandRunner;
use crate::steps::{
    build_plan, execute_step, ExecutionOptions, Step, StepAction, StepResult, StepStatus,
};

/// Progress events emitted during a run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to start.
    StepStarting {
        step: &'a Step,
        index: usize,
        total: usize,
    },
    /// A step finished (completed, skipped or planned).
    StepFinished { result: &'a StepResult },
    /// A step failed; no further steps will run.
    StepFailed {
        step: &'a Step,
        error: &'a SetupError,
    },
    /// Follow-up guidance to show the operator.
    Instructions { lines: &'a [String] },
}

/// Options for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Describe each step instead of executing it.
    pub dry_run: bool,
    /// Capture command output instead of inheriting the terminal.
    pub capture_output: bool,
}

/// The step that stopped a run.
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    /// Zero-based position in the plan.
    pub index: usize,
    /// Step identifier.
    pub id: String,
    /// Progress label.
    pub label: String,
    /// Rendered error.
    pub message: String,
    /// Exit code of the failing command, when a command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Captured stderr of the failing command.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
}

impl StepFailure {
    fn new(index: usize, step: &Step, error: &SetupError) -> Self {
        let output = match error {
            SetupError::CommandFailed { output, .. } => output.clone(),
            _ => String::new(),
        };
        Self {
            index,
            id: step.id.to_string(),
            label: step.label.clone(),
            message: error.to_string(),
            exit_code: error.exit_code(),
            output,
        }
    }
}

/// Structured outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Application being provisioned.
    pub app_name: String,
    /// Project root on the host.
    pub project_dir: PathBuf,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: DateTime<Utc>,
    /// Results of the steps that did not fail, in order.
    pub steps: Vec<StepResult>,
    /// The failing step, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
    /// Identifiers of steps never started because of the failure.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_run: Vec<String>,
}

impl RunReport {
    /// Whether every step completed, was skipped, or was planned.
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> std::time::Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Result for a step id, if the step ran.
    pub fn step(&self, id: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Number of steps with the given status.
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Executes the provisioning plan in order, stopping at the first failure.
pub struct ProvisionRunner {
    app_name: String,
    project_dir: PathBuf,
    steps: Vec<Step>,
}

impl ProvisionRunner {
    /// Create a runner for the plan built from `config`.
    pub fn new(config: &ProvisionConfig) -> Self {
        Self::with_steps(config, build_plan(config))
    }

    /// Create a runner for an explicit list of steps.
    pub fn with_steps(config: &ProvisionConfig, steps: Vec<Step>) -> Self {
        Self {
            app_name: config.app_name.clone(),
            project_dir: config.project_dir.clone(),
            steps,
        }
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run without progress reporting.
    pub fn run(&self, runner: &mut dyn CommandRunner, options: &RunOptions) -> RunReport {
        self.run_with_progress(runner, options, |_| {})
    }

    /// Run with a progress callback.
    pub fn run_with_progress(
        &self,
        runner: &mut dyn CommandRunner,
        options: &RunOptions,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> RunReport {
        let started_at = Utc::now();
        let exec_options = ExecutionOptions {
            dry_run: options.dry_run,
            capture_output: options.capture_output,
        };
        let total = self.steps.len();

        let mut results: Vec<StepResult> = Vec::with_capacity(total);
        let mut failure = None;
        let mut not_run = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            if failure.is_some() {
                not_run.push(step.id.to_string());
                continue;
            }

            on_progress(RunProgress::StepStarting { step, index, total });
            debug!("[{}/{}] {} ({})", index + 1, total, step.label, step.id);

            match execute_step(step, runner, &exec_options) {
                Ok(result) => {
                    if let StepAction::Instructions { general, service } = &step.action {
                        on_progress(RunProgress::Instructions { lines: general });
                        if service_installed(&results) {
                            on_progress(RunProgress::Instructions { lines: service });
                        }
                    }
                    on_progress(RunProgress::StepFinished { result: &result });
                    results.push(result);
                }
                Err(error) => {
                    debug!("step {} failed: {}", step.id, error);
                    on_progress(RunProgress::StepFailed {
                        step,
                        error: &error,
                    });
                    failure = Some(StepFailure::new(index, step, &error));
                }
            }
        }

        RunReport {
            app_name: self.app_name.clone(),
            project_dir: self.project_dir.clone(),
            dry_run: options.dry_run,
            started_at,
            finished_at: Utc::now(),
            steps: results,
            failure,
            not_run,
        }
    }
}

fn service_installed(results: &[StepResult]) -> bool {
    results.iter().any(|r| {
        r.id == "install-service" && matches!(r.status, StepStatus::Completed | StepStatus::Planned)
    })
}
