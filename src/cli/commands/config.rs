//! Config command implementation.
//!
//! The `pishgoo-setup config` command shows the resolved configuration.

use crate::cli::args::ConfigArgs;
use crate::error::{Result, SetupError};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, ConfigOverrides, CONFIG_ERROR_EXIT};

/// The config command implementation.
pub struct ConfigCommand {
    overrides: ConfigOverrides,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(overrides: ConfigOverrides, args: ConfigArgs) -> Self {
        Self { overrides, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ConfigArgs {
        &self.args
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some((config, source)) = self.overrides.load_for(ui)? else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&config).map_err(|e| SetupError::Other(e.into()))?;
            ui.message(&json);
        } else {
            let yaml = serde_yaml::to_string(&config).map_err(|e| SetupError::Other(e.into()))?;
            ui.message(&format!("# {}", source));
            ui.message(yaml.trim_end());
        }

        Ok(CommandResult::success())
    }
}
