//! Configuration schema definitions.
//!
//! These structs map to the optional `provision.yml` file. Every field has a
//! default, so an empty file (or no file at all) describes the stock Pishgoo
//! host layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for provision.yml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Application name (for display purposes)
    pub app_name: String,

    /// Project root directory on the target host
    pub project_dir: PathBuf,

    /// Global settings
    pub settings: Settings,

    /// OS packages installed in the package step
    pub packages: Vec<String>,

    /// Python runtime and environment layout
    pub python: PythonConfig,

    /// Working directories created under the project root
    pub data_dirs: Vec<PathBuf>,

    /// Files that get their executable bits set
    pub executables: Vec<PathBuf>,

    /// Optional service unit registration
    pub service: ServiceConfig,

    /// Dashboard launch details (only printed, never executed)
    pub dashboard: DashboardConfig,

    /// File the operator fills with exchange credentials
    pub credentials_file: PathBuf,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            app_name: "Pishgoo".to_string(),
            project_dir: PathBuf::from("/opt/pishgoo"),
            settings: Settings::default(),
            packages: default_packages(),
            python: PythonConfig::default(),
            data_dirs: vec![
                PathBuf::from("logs"),
                PathBuf::from("models"),
                PathBuf::from("backtest_results"),
            ],
            executables: vec![
                PathBuf::from("app.py"),
                PathBuf::from("services/trader_service.py"),
            ],
            service: ServiceConfig::default(),
            dashboard: DashboardConfig::default(),
            credentials_file: PathBuf::from("config/config.json"),
        }
    }
}

fn default_packages() -> Vec<String> {
    ["python3", "python3-pip", "python3-venv", "git", "curl"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl ProvisionConfig {
    /// Resolve a path against the project root unless it is already absolute.
    pub fn project_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Absolute path of the virtual environment.
    pub fn venv_path(&self) -> PathBuf {
        self.project_path(&self.python.venv_dir)
    }

    /// Absolute path of a binary inside the virtual environment.
    pub fn venv_bin(&self, name: &str) -> PathBuf {
        self.venv_path().join("bin").join(name)
    }

    /// Absolute path of the dependency manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.project_path(&self.python.requirements)
    }

    /// Absolute path of the service unit source file.
    pub fn service_source(&self) -> PathBuf {
        self.project_path(&self.service.unit_file)
    }
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default output mode: verbose, quiet, silent
    pub default_output: OutputMode,

    /// Package manager program used for steps 1-3
    pub package_manager: String,

    /// Service manager program used to reload unit definitions
    pub service_manager: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_output: OutputMode::Verbose,
            package_manager: "apt-get".to_string(),
            service_manager: "systemctl".to_string(),
        }
    }
}

/// Output verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Verbose,
    Quiet,
    Silent,
}

/// Python runtime layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter used to create the virtual environment
    pub interpreter: String,

    /// Virtual environment directory (relative to the project root)
    pub venv_dir: PathBuf,

    /// Dependency manifest (relative to the project root)
    pub requirements: PathBuf,

    /// Upgrade pip inside the environment before installing dependencies
    pub upgrade_pip: bool,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            venv_dir: PathBuf::from("venv"),
            requirements: PathBuf::from("requirements.txt"),
            upgrade_pip: true,
        }
    }
}

/// Service unit registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unit file shipped with the project (relative to the project root)
    pub unit_file: PathBuf,

    /// System-wide unit directory the file is copied into
    pub unit_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unit_file: PathBuf::from("pishgoo.service"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
        }
    }
}

impl ServiceConfig {
    /// Unit name as the service manager knows it (file stem).
    pub fn unit_name(&self) -> String {
        self.unit_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Dashboard launch details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dashboard entry script (relative to the project root)
    pub script: PathBuf,

    /// Listen port
    pub port: u16,

    /// Bind address
    pub address: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("dashboard/app.py"),
            port: 8501,
            address: "0.0.0.0".to_string(),
        }
    }
}
