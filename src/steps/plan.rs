//! Plan construction.
//!
//! Turns a [`ProvisionConfig`] into the fixed, ordered list of steps.

use crate::config::ProvisionConfig;
use crate::shell::CommandSpec;

use super::step::{Step, StepAction};

/// Step identifiers in execution order.
pub const STEP_IDS: [&str; 10] = [
    "update-index",
    "upgrade-packages",
    "install-packages",
    "project-dir",
    "create-venv",
    "install-deps",
    "data-dirs",
    "make-executable",
    "install-service",
    "next-steps",
];

/// Build the provisioning plan for `config`.
pub fn build_plan(config: &ProvisionConfig) -> Vec<Step> {
    let pm = config.settings.package_manager.as_str();
    let project = &config.project_dir;
    let venv = config.venv_path();
    let pip = config.venv_bin("pip").display().to_string();
    let manifest = config.manifest_path();

    let mut dep_commands = Vec::new();
    if config.python.upgrade_pip {
        dep_commands.push(
            CommandSpec::new(pip.clone())
                .args(["install", "--upgrade", "pip"])
                .current_dir(project),
        );
    }
    dep_commands.push(
        CommandSpec::new(pip)
            .args(["install", "-r"])
            .arg(manifest.display().to_string())
            .current_dir(project),
    );

    vec![
        Step::new(
            STEP_IDS[0],
            "Updating package index",
            StepAction::Commands(vec![apt(pm).arg("update")]),
        ),
        Step::new(
            STEP_IDS[1],
            "Upgrading installed packages",
            StepAction::Commands(vec![apt(pm).args(["upgrade", "-y"])]),
        ),
        Step::new(
            STEP_IDS[2],
            "Installing Python, pip, git and curl",
            StepAction::Commands(vec![apt(pm)
                .args(["install", "-y"])
                .args(config.packages.iter().cloned())]),
        ),
        Step::new(
            STEP_IDS[3],
            "Creating project directory",
            StepAction::EnsureDir(project.clone()),
        ),
        Step::new(
            STEP_IDS[4],
            "Creating virtual environment",
            StepAction::Commands(vec![CommandSpec::new(config.python.interpreter.clone())
                .args(["-m", "venv"])
                .arg(venv.display().to_string())
                .current_dir(project)]),
        ),
        Step::new(
            STEP_IDS[5],
            "Installing Python dependencies",
            StepAction::InstallDependencies {
                manifest,
                commands: dep_commands,
            },
        ),
        Step::new(
            STEP_IDS[6],
            "Creating data directories",
            StepAction::CreateDirs(
                config
                    .data_dirs
                    .iter()
                    .map(|d| config.project_path(d))
                    .collect(),
            ),
        ),
        Step::new(
            STEP_IDS[7],
            "Setting executable permissions",
            StepAction::MakeExecutable(
                config
                    .executables
                    .iter()
                    .map(|f| config.project_path(f))
                    .collect(),
            ),
        ),
        Step::new(
            STEP_IDS[8],
            "Installing systemd service",
            StepAction::InstallService {
                source: config.service_source(),
                unit_dir: config.service.unit_dir.clone(),
                reload: CommandSpec::new(config.settings.service_manager.clone())
                    .arg("daemon-reload"),
            },
        ),
        Step::new(STEP_IDS[9], "Next steps", next_steps(config)),
    ]
}

fn apt(program: &str) -> CommandSpec {
    CommandSpec::new(program).env("DEBIAN_FRONTEND", "noninteractive")
}

fn next_steps(config: &ProvisionConfig) -> StepAction {
    let project = config.project_dir.display();
    let streamlit = config
        .python
        .venv_dir
        .join("bin")
        .join("streamlit")
        .display()
        .to_string();
    let unit = config.service.unit_name();

    StepAction::Instructions {
        general: vec![
            format!(
                "Configure your exchange API credentials in {}",
                config.project_path(&config.credentials_file).display()
            ),
            format!(
                "Start the dashboard: cd {} && {} run {} --server.port {} --server.address {}",
                project,
                streamlit,
                config.dashboard.script.display(),
                config.dashboard.port,
                config.dashboard.address
            ),
        ],
        service: vec![
            format!("Start the trading service: sudo systemctl start {}", unit),
            format!("Start it on boot: sudo systemctl enable {}", unit),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn plan_has_ten_steps_in_order() {
        let plan = build_plan(&ProvisionConfig::default());
        let ids: Vec<_> = plan.iter().map(|s| s.id).collect();
        assert_eq!(ids, STEP_IDS.to_vec());
    }

    #[test]
    fn package_steps_use_package_manager() {
        let plan = build_plan(&ProvisionConfig::default());
        assert_eq!(plan[0].describe(), vec!["apt-get update".to_string()]);
        assert_eq!(plan[1].describe(), vec!["apt-get upgrade -y".to_string()]);
        assert_eq!(
            plan[2].describe(),
            vec!["apt-get install -y python3 python3-pip python3-venv git curl".to_string()]
        );
    }

    #[test]
    fn package_commands_are_noninteractive() {
        let plan = build_plan(&ProvisionConfig::default());
        match &plan[1].action {
            StepAction::Commands(cmds) => assert_eq!(
                cmds[0].env.get("DEBIAN_FRONTEND").map(String::as_str),
                Some("noninteractive")
            ),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn venv_and_pip_live_under_project() {
        let plan = build_plan(&ProvisionConfig::default());
        assert_eq!(
            plan[4].describe(),
            vec!["python3 -m venv /opt/pishgoo/venv".to_string()]
        );
        assert_eq!(
            plan[5].describe(),
            vec![
                "require /opt/pishgoo/requirements.txt".to_string(),
                "/opt/pishgoo/venv/bin/pip install --upgrade pip".to_string(),
                "/opt/pishgoo/venv/bin/pip install -r /opt/pishgoo/requirements.txt".to_string(),
            ]
        );
    }

    #[test]
    fn pip_upgrade_can_be_disabled() {
        let mut config = ProvisionConfig::default();
        config.python.upgrade_pip = false;
        let plan = build_plan(&config);
        match &plan[5].action {
            StepAction::InstallDependencies { commands, .. } => assert_eq!(commands.len(), 1),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn data_dirs_and_executables_resolve_against_project() {
        let plan = build_plan(&ProvisionConfig::default());
        assert_eq!(
            plan[6].action,
            StepAction::CreateDirs(vec![
                PathBuf::from("/opt/pishgoo/logs"),
                PathBuf::from("/opt/pishgoo/models"),
                PathBuf::from("/opt/pishgoo/backtest_results"),
            ])
        );
        assert_eq!(
            plan[7].action,
            StepAction::MakeExecutable(vec![
                PathBuf::from("/opt/pishgoo/app.py"),
                PathBuf::from("/opt/pishgoo/services/trader_service.py"),
            ])
        );
    }

    #[test]
    fn next_steps_mention_dashboard_and_service() {
        let plan = build_plan(&ProvisionConfig::default());
        match &plan[9].action {
            StepAction::Instructions { general, service } => {
                assert!(general[0].contains("/opt/pishgoo/config/config.json"));
                assert!(general[1].contains("--server.port 8501"));
                assert!(general[1].contains("--server.address 0.0.0.0"));
                assert!(service[0].contains("systemctl start pishgoo"));
                assert!(service[1].contains("systemctl enable pishgoo"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }
}
