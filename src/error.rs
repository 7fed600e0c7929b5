//! Error types for provisioning operations.
//!
//! This module defines [`SetupError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `SetupError` for failures the runner reports back to the operator
//! - Use `anyhow::Error` (via `SetupError::Other`) for unexpected errors
//! - Messages name the path, command or tool involved

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// External command exited non-zero or was killed by a signal.
    #[error("Command failed ({}): {command}", exit_status(*code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Captured stderr, empty when output was inherited.
        output: String,
    },

    /// External command could not be started.
    #[error("Failed to start '{command}': {source}")]
    CommandSpawn {
        command: String,
        source: std::io::Error,
    },

    /// The dependency manifest is missing from the project root.
    #[error("Dependency manifest not found: {path}")]
    ManifestMissing { path: PathBuf },

    /// A provisioning step failed for a reason other than a command exit.
    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// A tool the supported platform relies on is not installed.
    #[error("Unsupported platform: '{tool}' not found on PATH (Debian/Ubuntu with systemd required)")]
    UnsupportedPlatform { tool: String },

    /// The process lacks the privileges to change system state.
    #[error("Provisioning must run as root (try again with sudo)")]
    NotElevated,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SetupError {
    /// Exit code reported by the failing external command, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether the error comes from loading or validating configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
        )
    }
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, SetupError>;

fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = SetupError::ConfigNotFound {
            path: PathBuf::from("/etc/provision.yml"),
        };
        assert!(err.to_string().contains("/etc/provision.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = SetupError::ConfigParseError {
            path: PathBuf::from("/provision.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/provision.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = SetupError::CommandFailed {
            command: "apt-get update".into(),
            code: Some(100),
            output: String::new(),
        };
        let msg = err.to_string();
        assert_eq!(msg, "Command failed (exit code 100): apt-get update");
        assert_eq!(err.exit_code(), Some(100));
    }

    #[test]
    fn command_killed_by_signal_has_no_code() {
        let err = SetupError::CommandFailed {
            command: "pip install -r requirements.txt".into(),
            code: None,
            output: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("terminated by signal"));
        assert!(!msg.contains("None"));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn command_spawn_displays_os_error() {
        let err = SetupError::CommandSpawn {
            command: "python3 -m venv venv".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("python3 -m venv venv"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn manifest_missing_displays_path() {
        let err = SetupError::ManifestMissing {
            path: PathBuf::from("/opt/pishgoo/requirements.txt"),
        };
        assert!(err.to_string().contains("requirements.txt"));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn step_failed_displays_step_and_message() {
        let err = SetupError::StepFailed {
            step: "make-executable".into(),
            message: "app.py not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("make-executable"));
        assert!(msg.contains("app.py not found"));
    }

    #[test]
    fn unsupported_platform_names_tool() {
        let err = SetupError::UnsupportedPlatform {
            tool: "apt-get".into(),
        };
        assert!(err.to_string().contains("apt-get"));
    }

    #[test]
    fn config_errors_are_classified() {
        let err = SetupError::ConfigValidationError {
            message: "bad".into(),
        };
        assert!(err.is_config_error());
        assert!(!SetupError::NotElevated.is_config_error());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: SetupError = io_err.into();
        assert!(matches!(err, SetupError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(SetupError::NotElevated)
        }
        assert!(returns_error().is_err());
    }
}
