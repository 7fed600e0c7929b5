//! Run command implementation.
//!
//! The `pishgoo-setup run` command provisions the host.

use std::fs;
use std::path::Path;

use crate::cli::args::RunArgs;
use crate::error::{Result, SetupError};
use crate::runner::{ProvisionRunner, RunOptions, RunProgress, RunReport};
use crate::shell::{preflight, CommandRunner, SystemRunner};
use crate::steps::{StepAction, StepStatus};
use crate::ui::{format_duration, OutputMode, Prompt, SpinnerHandle, UserInterface};

use super::dispatcher::{Command, CommandResult, ConfigOverrides, CONFIG_ERROR_EXIT};

/// Prompt key for the confirmation asked before a real run.
pub const PROCEED_PROMPT: &str = "proceed";

/// The run command implementation.
pub struct RunCommand {
    overrides: ConfigOverrides,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(overrides: ConfigOverrides, args: RunArgs) -> Self {
        Self { overrides, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Execute with an explicit command runner.
    pub fn execute_with(
        &self,
        ui: &mut dyn UserInterface,
        runner: &mut dyn CommandRunner,
    ) -> Result<CommandResult> {
        let Some((config, source)) = self.overrides.load_for(ui)? else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        ui.show_header(&format!("Provisioning {}", config.app_name));
        if self.args.dry_run || ui.output_mode() == OutputMode::Verbose {
            ui.message(&format!("Config: {}", source));
            ui.message(&format!("Project: {}", config.project_dir.display()));
        }

        if self.args.dry_run {
            ui.message("Running in dry-run mode - no commands will be executed");
        } else {
            if !self.args.skip_preflight {
                if let Err(e) = preflight(&config) {
                    ui.error(&e.to_string());
                    return Ok(CommandResult::failure(1));
                }
            }

            if !self.args.yes {
                let prompt = Prompt::confirm(
                    PROCEED_PROMPT,
                    &format!(
                        "This will install packages and modify {}. Continue?",
                        config.project_dir.display()
                    ),
                    true,
                );
                if !ui.confirm(&prompt)? {
                    ui.warning("Provisioning cancelled");
                    return Ok(CommandResult::failure(1));
                }
            }
        }

        let mode = ui.output_mode();
        let options = RunOptions {
            dry_run: self.args.dry_run,
            capture_output: !mode.shows_command_output(),
        };
        let use_spinner = mode.shows_spinners() && !self.args.dry_run;
        let hint = (!mode.shows_command_output())
            .then_some("Re-run with --verbose to see the full command output");

        let provisioner = ProvisionRunner::new(&config);
        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;

        let report = provisioner.run_with_progress(runner, &options, |progress| match progress {
            RunProgress::StepStarting { step, index, total } => {
                let prints_lines = matches!(step.action, StepAction::Instructions { .. });
                if use_spinner && !prints_lines {
                    let msg = format!("[{}/{}] {}", index + 1, total, step.label);
                    spinner = Some(ui.start_spinner(&msg));
                } else {
                    ui.show_progress(index + 1, total, &step.label);
                }
                if self.args.dry_run {
                    for line in step.describe() {
                        ui.message(&format!("    {}", line));
                    }
                }
            }
            RunProgress::StepFinished { result } => {
                let line = result.summary_line();
                match (result.status, spinner.take()) {
                    (StepStatus::Skipped, Some(mut s)) => s.finish_skipped(&line),
                    (StepStatus::Skipped, None) => ui.warning(&line),
                    (StepStatus::Planned, _) => {}
                    (_, Some(mut s)) => s.finish_success(&line),
                    (_, None) => ui.success(&line),
                }
            }
            RunProgress::StepFailed { step, error } => {
                match spinner.take() {
                    Some(mut s) => s.finish_error(&step.label),
                    None => ui.error(&format!("{} failed", step.label)),
                }
                if let SetupError::CommandFailed {
                    command, output, ..
                } = error
                {
                    ui.show_error_block(command, output, hint);
                }
                ui.error(&format!("{}: {}", step.label, error));
            }
            RunProgress::Instructions { lines } => {
                for line in lines {
                    ui.message(&format!("  - {}", line));
                }
            }
        });

        if let Some(path) = &self.args.report {
            write_report(&report, path)?;
            ui.message(&format!("Report written to {}", path.display()));
        }

        Ok(summarize(&report, ui))
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut runner = SystemRunner::new();
        self.execute_with(ui, &mut runner)
    }
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| SetupError::Other(e.into()))?;
    fs::write(path, json)?;
    Ok(())
}

fn summarize(report: &RunReport, ui: &mut dyn UserInterface) -> CommandResult {
    match &report.failure {
        None if report.dry_run => {
            ui.success(&format!(
                "Dry run complete ({} steps planned, {} skipped)",
                report.count(StepStatus::Planned),
                report.count(StepStatus::Skipped)
            ));
            CommandResult::success()
        }
        None => {
            ui.success(&format!(
                "Provisioning complete in {} ({} completed, {} skipped)",
                format_duration(report.duration()),
                report.count(StepStatus::Completed),
                report.count(StepStatus::Skipped)
            ));
            CommandResult::success()
        }
        Some(failure) => {
            ui.error(&format!(
                "Provisioning failed at step {} ({})",
                failure.index + 1,
                failure.id
            ));
            if !report.not_run.is_empty() {
                ui.message(&format!("Not run: {}", report.not_run.join(", ")));
            }
            CommandResult::failure(failure_exit_code(failure.exit_code))
        }
    }
}

/// Exit code for a failed run: the failing command's own code when it is a
/// usable process status, otherwise 1.
fn failure_exit_code(command_code: Option<i32>) -> i32 {
    command_code.filter(|c| (1..=255).contains(c)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandResult as ShellResult, CommandSpec, OutputCallback};
    use crate::ui::MockUI;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeRunner {
        calls: Vec<String>,
        fail_on: Option<(&'static str, i32)>,
    }

    impl CommandRunner for FakeRunner {
        fn run(
            &mut self,
            spec: &CommandSpec,
            _callback: Option<OutputCallback>,
        ) -> Result<ShellResult> {
            let line = spec.display();
            self.calls.push(line.clone());
            if let Some((_, code)) = self.fail_on.filter(|(f, _)| line.contains(f)) {
                Ok(ShellResult::failure(
                    Some(code),
                    String::new(),
                    "ERROR: No matching distribution".to_string(),
                    Duration::ZERO,
                ))
            } else {
                Ok(ShellResult::success(String::new(), String::new(), Duration::ZERO))
            }
        }
    }

    fn project(temp: &TempDir) -> ConfigOverrides {
        let root = temp.path().join("pishgoo");
        fs::create_dir_all(root.join("services")).unwrap();
        fs::write(root.join("requirements.txt"), "streamlit\n").unwrap();
        fs::write(root.join("app.py"), "").unwrap();
        fs::write(root.join("services/trader_service.py"), "").unwrap();
        fs::write(
            temp.path().join("provision.yml"),
            format!(
                "project_dir: {}\nservice:\n  unit_dir: {}\n",
                root.display(),
                temp.path().join("systemd").display()
            ),
        )
        .unwrap();
        ConfigOverrides::new(temp.path())
    }

    fn real_run() -> RunArgs {
        RunArgs {
            yes: true,
            skip_preflight: true,
            ..Default::default()
        }
    }

    #[test]
    fn run_command_args() {
        let args = RunArgs {
            dry_run: true,
            ..Default::default()
        };
        let cmd = RunCommand::new(ConfigOverrides::default(), args);
        assert!(cmd.args().dry_run);
    }

    #[test]
    fn missing_config_file_exits_with_config_error() {
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            config_file: Some(PathBuf::from("/nonexistent/provision.yml")),
            ..ConfigOverrides::new(temp.path())
        };
        let mut ui = MockUI::new();
        let mut fake = FakeRunner::default();

        let result = RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(fake.calls.is_empty());
    }

    #[test]
    fn dry_run_executes_nothing() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::new();
        let mut fake = FakeRunner::default();
        let args = RunArgs {
            dry_run: true,
            ..Default::default()
        };

        let result = RunCommand::new(overrides, args)
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert!(result.success);
        assert!(fake.calls.is_empty());
        assert!(ui.has_message("apt-get update"));
        assert!(ui.has_success("Dry run complete"));
        assert!(ui.prompts_shown().is_empty());
        assert!(!temp.path().join("pishgoo/logs").exists());
    }

    #[test]
    fn real_run_succeeds_and_prints_instructions() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::new();
        let mut fake = FakeRunner::default();

        let result = RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_success("Provisioning complete"));
        assert!(ui.has_message("streamlit run dashboard/app.py"));
        assert!(!ui.has_message("systemctl start"));
        assert_eq!(ui.progress().len(), 10);
    }

    #[test]
    fn declined_confirmation_exits_one() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::new();
        ui.set_prompt_response(PROCEED_PROMPT, false);
        let mut fake = FakeRunner::default();
        let args = RunArgs {
            skip_preflight: true,
            ..Default::default()
        };

        let result = RunCommand::new(overrides, args)
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(fake.calls.is_empty());
        assert!(ui.has_warning("cancelled"));
    }

    #[test]
    fn command_failure_shows_error_block() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::new();
        let mut fake = FakeRunner {
            fail_on: Some((" -r ", 1)),
            ..Default::default()
        };

        let result = RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Installing Python dependencies"));
        assert!(ui.has_error("Provisioning failed at step 6 (install-deps)"));
        let (command, output, _) = &ui.error_blocks()[0];
        assert!(command.ends_with("requirements.txt"));
        assert!(output.contains("No matching distribution"));
        assert!(ui.has_message("Not run: data-dirs"));
    }

    #[test]
    fn quiet_mode_uses_spinners() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::with_mode(OutputMode::Quiet);
        let mut fake = FakeRunner::default();

        RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert_eq!(ui.spinners().len(), 9);
        assert!(ui.spinners()[0].starts_with("[1/10]"));
        assert!(ui.spinners().iter().all(|s| !s.contains("Next steps")));
        assert_eq!(ui.spinner_finishes().len(), 9);
        assert_eq!(ui.progress(), [(10, 10, "Next steps".to_string())]);
        assert!(ui.has_message("streamlit run"));
    }

    #[test]
    fn failing_command_sets_exit_code() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::new();
        let mut fake = FakeRunner {
            fail_on: Some(("apt-get update", 100)),
            ..Default::default()
        };

        let result = RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert_eq!(result.exit_code, 100);
        assert_eq!(fake.calls.len(), 1);
    }

    #[test]
    fn missing_manifest_exits_one() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        fs::remove_file(temp.path().join("pishgoo/requirements.txt")).unwrap();
        let mut ui = MockUI::new();
        let mut fake = FakeRunner::default();

        let result = RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Dependency manifest not found"));
    }

    #[test]
    fn exit_code_falls_back_to_one() {
        assert_eq!(failure_exit_code(Some(100)), 100);
        assert_eq!(failure_exit_code(None), 1);
        assert_eq!(failure_exit_code(Some(0)), 1);
        assert_eq!(failure_exit_code(Some(256)), 1);
        assert_eq!(failure_exit_code(Some(-9)), 1);
    }

    #[test]
    fn quiet_failure_suggests_verbose() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let mut ui = MockUI::with_mode(OutputMode::Quiet);
        let mut fake = FakeRunner {
            fail_on: Some(("upgrade", 100)),
            ..Default::default()
        };

        RunCommand::new(overrides, real_run())
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        let (_, _, hint) = &ui.error_blocks()[0];
        assert!(hint.as_deref().is_some_and(|h| h.contains("--verbose")));
    }

    #[test]
    fn report_is_written() {
        let temp = TempDir::new().unwrap();
        let overrides = project(&temp);
        let report_path = temp.path().join("report.json");
        let mut ui = MockUI::new();
        let mut fake = FakeRunner::default();
        let args = RunArgs {
            report: Some(report_path.clone()),
            ..real_run()
        };

        RunCommand::new(overrides, args)
            .execute_with(&mut ui, &mut fake)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["steps"].as_array().unwrap().len(), 10);
        assert_eq!(json["app_name"], "Pishgoo");
    }
}
