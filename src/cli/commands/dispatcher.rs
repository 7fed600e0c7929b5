//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`ConfigOverrides`] for loading the effective configuration
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::PathBuf;

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::{load_config, validate, ConfigSource, ProvisionConfig};
use crate::error::Result;
use crate::ui::{OutputMode, UserInterface};

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Exit code for configuration errors.
pub const CONFIG_ERROR_EXIT: i32 = 2;

/// Where to find configuration and which values the command line overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Directory searched for `provision.yml`.
    pub working_dir: PathBuf,
    /// Explicit config file (`--config`).
    pub config_file: Option<PathBuf>,
    /// Project root override (`--project-dir`).
    pub project_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Overrides rooted at `working_dir` with nothing overridden.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    /// Load, apply overrides, and validate.
    pub fn load(&self) -> Result<(ProvisionConfig, ConfigSource)> {
        let (mut config, source) = load_config(&self.working_dir, self.config_file.as_deref())?;
        if let Some(dir) = &self.project_dir {
            config.project_dir = dir.clone();
        }
        validate(&config)?;
        Ok((config, source))
    }

    /// Load the configuration for a command, reporting configuration errors
    /// through the UI.
    ///
    /// Returns `Ok(None)` when the command should exit with
    /// [`CONFIG_ERROR_EXIT`]. Also applies the configured default output
    /// mode when no CLI flag chose one.
    pub fn load_for(
        &self,
        ui: &mut dyn UserInterface,
    ) -> Result<Option<(ProvisionConfig, ConfigSource)>> {
        match self.load() {
            Ok((config, source)) => {
                if ui.output_mode() == OutputMode::Normal {
                    ui.set_output_mode(config.settings.default_output.into());
                }
                Ok(Some((config, source)))
            }
            Err(e) if e.is_config_error() => {
                ui.error(&e.to_string());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    overrides: ConfigOverrides,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(overrides: ConfigOverrides) -> Self {
        Self { overrides }
    }

    /// Get the config overrides.
    pub fn overrides(&self) -> &ConfigOverrides {
        &self.overrides
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(self.overrides.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Plan(args)) => {
                let cmd = super::plan::PlanCommand::new(self.overrides.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Config(args)) => {
                let cmd = super::config::ConfigCommand::new(self.overrides.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                // Default to run command with default args
                let cmd = super::run::RunCommand::new(self.overrides.clone(), RunArgs::default());
                cmd.execute(ui)
            }
        }
    }
}
