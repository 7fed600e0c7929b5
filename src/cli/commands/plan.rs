//! Plan command implementation.
//!
//! The `pishgoo-setup plan` command lists the ordered steps without running
//! anything.

use serde::Serialize;

use crate::cli::args::PlanArgs;
use crate::error::{Result, SetupError};
use crate::steps::build_plan;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, ConfigOverrides, CONFIG_ERROR_EXIT};

/// The plan command implementation.
pub struct PlanCommand {
    overrides: ConfigOverrides,
    args: PlanArgs,
}

#[derive(Debug, Serialize)]
struct PlanEntry {
    index: usize,
    id: &'static str,
    label: String,
    actions: Vec<String>,
}

impl PlanCommand {
    /// Create a new plan command.
    pub fn new(overrides: ConfigOverrides, args: PlanArgs) -> Self {
        Self { overrides, args }
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some((config, _)) = self.overrides.load_for(ui)? else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        let entries: Vec<PlanEntry> = build_plan(&config)
            .into_iter()
            .enumerate()
            .map(|(i, step)| PlanEntry {
                index: i + 1,
                id: step.id,
                actions: step.describe(),
                label: step.label,
            })
            .collect();

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&entries).map_err(|e| SetupError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("{} provisioning plan", config.app_name));
        for entry in &entries {
            ui.message(&format!("{:>2}. {} [{}]", entry.index, entry.label, entry.id));
            for action in &entry.actions {
                ui.message(&format!("      {}", action));
            }
        }

        Ok(CommandResult::success())
    }
}
