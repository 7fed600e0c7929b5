//! End-to-end provisioning through the public API with a recording runner.

use std::fs;
use std::path::Path;
use std::time::Duration;

use pishgoo_setup::config::ProvisionConfig;
use pishgoo_setup::runner::{ProvisionRunner, RunOptions};
use pishgoo_setup::shell::{CommandResult, CommandRunner, CommandSpec, OutputCallback};
use pishgoo_setup::steps::StepStatus;
use pishgoo_setup::Result;
use tempfile::TempDir;

/// Records every command and reports success.
#[derive(Default)]
struct RecordingRunner {
    calls: Vec<String>,
}

impl CommandRunner for RecordingRunner {
    fn run(
        &mut self,
        spec: &CommandSpec,
        _callback: Option<OutputCallback>,
    ) -> Result<CommandResult> {
        self.calls.push(spec.display());
        Ok(CommandResult::success(
            String::new(),
            String::new(),
            Duration::ZERO,
        ))
    }
}

struct Host {
    _temp: TempDir,
    config: ProvisionConfig,
}

impl Host {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("pishgoo");
        fs::create_dir_all(root.join("services")).unwrap();
        fs::write(root.join("requirements.txt"), "ccxt\nstreamlit\n").unwrap();
        fs::write(root.join("app.py"), "print('pishgoo')\n").unwrap();
        fs::write(root.join("services/trader_service.py"), "").unwrap();

        let unit_dir = temp.path().join("etc/systemd/system");
        fs::create_dir_all(&unit_dir).unwrap();

        let mut config = ProvisionConfig {
            project_dir: root,
            ..Default::default()
        };
        config.service.unit_dir = unit_dir;
        Self {
            _temp: temp,
            config,
        }
    }

    fn root(&self) -> &Path {
        &self.config.project_dir
    }

    fn run(&self, runner: &mut RecordingRunner) -> pishgoo_setup::runner::RunReport {
        ProvisionRunner::new(&self.config).run(runner, &RunOptions::default())
    }
}

#[test]
fn full_run_leaves_empty_data_dirs() {
    let host = Host::new();
    let mut runner = RecordingRunner::default();

    let report = host.run(&mut runner);

    assert!(report.success());
    for dir in ["logs", "models", "backtest_results"] {
        let path = host.root().join(dir);
        assert!(path.is_dir(), "{} missing", dir);
        assert_eq!(fs::read_dir(&path).unwrap().count(), 0);
    }
}

#[test]
fn missing_manifest_stops_the_run() {
    let host = Host::new();
    fs::remove_file(host.root().join("requirements.txt")).unwrap();
    let mut runner = RecordingRunner::default();

    let report = host.run(&mut runner);

    let failure = report.failure.as_ref().expect("run should fail");
    assert_eq!(failure.id, "install-deps");
    assert_eq!(
        report.not_run,
        vec!["data-dirs", "make-executable", "install-service", "next-steps"]
    );
    assert!(!host.root().join("logs").exists());
    assert!(runner.calls.iter().all(|c| !c.contains("/bin/pip")));
    assert!(runner.calls.last().unwrap().contains("-m venv"));
}

#[test]
fn absent_unit_file_is_skipped() {
    let host = Host::new();
    let mut runner = RecordingRunner::default();

    let report = host.run(&mut runner);

    assert!(report.success());
    assert_eq!(
        report.step("install-service").map(|s| s.status),
        Some(StepStatus::Skipped)
    );
    assert_eq!(
        report.step("next-steps").map(|s| s.status),
        Some(StepStatus::Completed)
    );
    assert!(!runner.calls.iter().any(|c| c.contains("daemon-reload")));
}

#[test]
fn present_unit_file_is_installed() {
    let host = Host::new();
    let unit = "[Unit]\nDescription=Pishgoo trader\n\n[Service]\nExecStart=/opt/pishgoo/venv/bin/python services/trader_service.py\n";
    fs::write(host.root().join("pishgoo.service"), unit).unwrap();
    let mut runner = RecordingRunner::default();

    let report = host.run(&mut runner);

    assert!(report.success());
    let installed = host.config.service.unit_dir.join("pishgoo.service");
    assert_eq!(fs::read(installed).unwrap(), unit.as_bytes());
    assert_eq!(
        runner.calls.last().map(String::as_str),
        Some("systemctl daemon-reload")
    );
}

#[test]
fn rerun_over_existing_project_succeeds() {
    let host = Host::new();
    let mut first = RecordingRunner::default();
    assert!(host.run(&mut first).success());

    let mut second = RecordingRunner::default();
    let report = host.run(&mut second);

    assert!(report.success());
    assert_eq!(
        report.step("project-dir").and_then(|s| s.detail.as_deref()),
        Some("already exists")
    );
}

#[cfg(unix)]
#[test]
fn entry_points_become_executable() {
    use std::os::unix::fs::PermissionsExt;

    let host = Host::new();
    let mut runner = RecordingRunner::default();

    assert!(host.run(&mut runner).success());

    for file in ["app.py", "services/trader_service.py"] {
        let mode = fs::metadata(host.root().join(file))
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o100, 0, "{} lacks owner execute bit", file);
    }
}

#[test]
fn commands_run_in_plan_order() {
    let host = Host::new();
    let mut runner = RecordingRunner::default();

    host.run(&mut runner);

    assert_eq!(runner.calls[0], "apt-get update");
    assert_eq!(runner.calls[1], "apt-get upgrade -y");
    assert_eq!(
        runner.calls[2],
        "apt-get install -y python3 python3-pip python3-venv git curl"
    );
    assert!(runner.calls[3].starts_with("python3 -m venv"));
    assert!(runner.calls[4].ends_with("pip install --upgrade pip"));
}
