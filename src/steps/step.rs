//! Typed provisioning steps.

use crate::shell::CommandSpec;
use std::path::PathBuf;

/// One entry of the provisioning plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Stable identifier (e.g. `install-deps`).
    pub id: &'static str,

    /// Progress label shown to the operator.
    pub label: String,

    /// What the step does.
    pub action: StepAction,
}

impl Step {
    /// Create a step.
    pub fn new(id: &'static str, label: impl Into<String>, action: StepAction) -> Self {
        Self {
            id,
            label: label.into(),
            action,
        }
    }

    /// Lines describing the step's effects, for `plan` and dry runs.
    pub fn describe(&self) -> Vec<String> {
        self.action.describe()
    }
}

/// The work a step performs.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Run external commands in order.
    Commands(Vec<CommandSpec>),

    /// Create a directory and its parents; an existing directory is fine.
    EnsureDir(PathBuf),

    /// Create several directories under the project root.
    CreateDirs(Vec<PathBuf>),

    /// Set execute bits on existing files.
    MakeExecutable(Vec<PathBuf>),

    /// Install the dependency manifest into the virtual environment.
    ///
    /// Fails before running anything when `manifest` is missing.
    InstallDependencies {
        manifest: PathBuf,
        commands: Vec<CommandSpec>,
    },

    /// Copy a unit file into the service manager's directory and reload it.
    ///
    /// Skipped when `source` does not exist.
    InstallService {
        source: PathBuf,
        unit_dir: PathBuf,
        reload: CommandSpec,
    },

    /// Print follow-up guidance for the operator.
    Instructions {
        /// Always printed.
        general: Vec<String>,
        /// Printed only when the service step installed the unit.
        service: Vec<String>,
    },
}

impl StepAction {
    /// Lines describing the action's effects.
    pub fn describe(&self) -> Vec<String> {
        match self {
            StepAction::Commands(commands) => commands.iter().map(CommandSpec::display).collect(),
            StepAction::EnsureDir(path) => vec![format!("mkdir -p {}", path.display())],
            StepAction::CreateDirs(paths) => paths
                .iter()
                .map(|p| format!("mkdir -p {}", p.display()))
                .collect(),
            StepAction::MakeExecutable(paths) => paths
                .iter()
                .map(|p| format!("chmod +x {}", p.display()))
                .collect(),
            StepAction::InstallDependencies { manifest, commands } => {
                let mut lines = vec![format!("require {}", manifest.display())];
                lines.extend(commands.iter().map(CommandSpec::display));
                lines
            }
            StepAction::InstallService {
                source,
                unit_dir,
                reload,
            } => vec![
                format!("if {} exists:", source.display()),
                format!("  cp {} {}/", source.display(), unit_dir.display()),
                format!("  {}", reload.display()),
            ],
            StepAction::Instructions { .. } => vec!["print next steps".to_string()],
        }
    }
}
