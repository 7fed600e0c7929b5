//! Step execution engine.
//!
//! Executes one [`Step`] against the host. Command actions go through a
//! [`CommandRunner`]; filesystem actions use `std::fs` directly.

use crate::error::{Result, SetupError};
use crate::shell::{CommandRunner, CommandSpec, OutputCallback, OutputLine};
use crate::steps::step::{Step, StepAction};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Status of a step that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step completed successfully.
    Completed,

    /// Step was skipped (optional input absent).
    Skipped,

    /// Dry run: step would have run.
    Planned,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
            StepStatus::Planned => "planned",
        };
        write!(f, "{}", s)
    }
}

/// Result of a step that did not fail.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Step identifier.
    pub id: String,

    /// Progress label.
    pub label: String,

    /// Final status. Failures are returned as errors instead.
    pub status: StepStatus,

    /// Execution duration.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// Extra detail (e.g. "already exists", skip reason).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepResult {
    fn new(step: &Step, status: StepStatus, duration: Duration, detail: Option<String>) -> Self {
        Self {
            id: step.id.to_string(),
            label: step.label.clone(),
            status,
            duration,
            detail,
        }
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let duration = crate::ui::format_duration(self.duration);
        match (&self.status, &self.detail) {
            (StepStatus::Skipped, Some(reason)) => {
                format!("{} (skipped: {})", self.label, reason)
            }
            (StepStatus::Skipped, None) => format!("{} (skipped)", self.label),
            (StepStatus::Planned, _) => format!("{} (dry run)", self.label),
            (_, Some(detail)) => format!("{} ({}, {})", self.label, detail, duration),
            _ => format!("{} ({})", self.label, duration),
        }
    }
}

pub(crate) fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Options for step execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Describe instead of executing.
    pub dry_run: bool,

    /// Capture command output instead of inheriting the terminal.
    pub capture_output: bool,
}

/// Execute a single step.
///
/// Returns the failure as an error; nothing is rolled back.
pub fn execute_step(
    step: &Step,
    runner: &mut dyn CommandRunner,
    options: &ExecutionOptions,
) -> Result<StepResult> {
    let start = Instant::now();

    if options.dry_run {
        return Ok(dry_run(step));
    }

    let (status, detail) = match &step.action {
        StepAction::Commands(commands) => {
            run_commands(commands, runner, options)?;
            (StepStatus::Completed, None)
        }
        StepAction::EnsureDir(path) => {
            let existed = path.is_dir();
            fs::create_dir_all(path)?;
            let detail = if existed { "already exists" } else { "created" };
            (StepStatus::Completed, Some(detail.to_string()))
        }
        StepAction::CreateDirs(paths) => {
            let mut created = 0;
            for path in paths {
                if !path.is_dir() {
                    created += 1;
                }
                fs::create_dir_all(path)?;
            }
            let detail = format!("{} created, {} present", created, paths.len() - created);
            (StepStatus::Completed, Some(detail))
        }
        StepAction::MakeExecutable(paths) => {
            for path in paths {
                make_executable(step.id, path)?;
            }
            (StepStatus::Completed, None)
        }
        StepAction::InstallDependencies { manifest, commands } => {
            if !manifest.is_file() {
                return Err(SetupError::ManifestMissing {
                    path: manifest.clone(),
                });
            }
            run_commands(commands, runner, options)?;
            (StepStatus::Completed, None)
        }
        StepAction::InstallService {
            source,
            unit_dir,
            reload,
        } => {
            if !source.is_file() {
                tracing::debug!("{} not found, skipping service install", source.display());
                (
                    StepStatus::Skipped,
                    Some(format!("{} not found", source.display())),
                )
            } else {
                let dest = install_unit(step.id, source, unit_dir)?;
                run_commands(std::slice::from_ref(reload), runner, options)?;
                (
                    StepStatus::Completed,
                    Some(format!("installed {}", dest.display())),
                )
            }
        }
        StepAction::Instructions { .. } => (StepStatus::Completed, None),
    };

    Ok(StepResult::new(step, status, start.elapsed(), detail))
}

fn dry_run(step: &Step) -> StepResult {
    // The service branch is evaluated even in dry runs so the plan shows it.
    match &step.action {
        StepAction::InstallService { source, .. } if !source.is_file() => StepResult::new(
            step,
            StepStatus::Skipped,
            Duration::ZERO,
            Some(format!("{} not found", source.display())),
        ),
        StepAction::Instructions { .. } => {
            StepResult::new(step, StepStatus::Completed, Duration::ZERO, None)
        }
        _ => StepResult::new(step, StepStatus::Planned, Duration::ZERO, None),
    }
}

fn run_commands(
    commands: &[CommandSpec],
    runner: &mut dyn CommandRunner,
    options: &ExecutionOptions,
) -> Result<()> {
    for spec in commands {
        let callback = options.capture_output.then(|| trace_output(&spec.program));
        let result = runner.run(spec, callback)?;
        if !result.success {
            return Err(SetupError::CommandFailed {
                command: spec.display(),
                code: result.exit_code,
                output: result.stderr,
            });
        }
    }
    Ok(())
}

fn trace_output(program: &str) -> OutputCallback {
    let program = program.to_string();
    Box::new(move |line| match line {
        OutputLine::Stdout(l) => tracing::trace!("{}: {}", program, l),
        OutputLine::Stderr(l) => tracing::trace!("{} (stderr): {}", program, l),
    })
}

#[cfg(unix)]
fn make_executable(step: &str, path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| SetupError::StepFailed {
        step: step.to_string(),
        message: format!("cannot chmod {}: {}", path.display(), e),
    })?;
    let mut perms = metadata.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    tracing::debug!("chmod +x {}", path.display());
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(step: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SetupError::StepFailed {
            step: step.to_string(),
            message: format!("cannot chmod {}: not found", path.display()),
        })
    }
}

fn install_unit(step: &str, source: &Path, unit_dir: &Path) -> Result<std::path::PathBuf> {
    let file_name = source.file_name().ok_or_else(|| SetupError::StepFailed {
        step: step.to_string(),
        message: format!("{} has no file name", source.display()),
    })?;
    let dest = unit_dir.join(file_name);
    fs::copy(source, &dest).map_err(|e| SetupError::StepFailed {
        step: step.to_string(),
        message: format!(
            "cannot copy {} to {}: {}",
            source.display(),
            dest.display(),
            e
        ),
    })?;
    tracing::debug!("copied {} -> {}", source.display(), dest.display());
    Ok(dest)
}
