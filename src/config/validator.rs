//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - The project root must be absolute
//! - Working directories and executables must stay inside the project root
//! - Program names and the package list must be non-empty
//! - The service unit file must carry a `.service` extension

use crate::config::schema::ProvisionConfig;
use crate::error::{Result, SetupError};
use std::path::{Component, Path};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Config field the error refers to
    pub field: String,
}

impl ValidationError {
    fn new(rule: &str, field: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            field: field.to_string(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// All rules run so users can fix several issues at once.
pub fn validate_config(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_project_dir(config));
    errors.extend(validate_programs(config));
    errors.extend(validate_relative_paths(config));
    errors.extend(validate_service(config));

    errors
}

fn validate_project_dir(config: &ProvisionConfig) -> Vec<ValidationError> {
    if config.project_dir.is_absolute() {
        Vec::new()
    } else {
        vec![ValidationError::new(
            "relative-project-dir",
            "project_dir",
            format!(
                "project_dir must be an absolute path, got '{}'",
                config.project_dir.display()
            ),
        )]
    }
}

fn validate_programs(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let programs = [
        ("settings.package_manager", &config.settings.package_manager),
        ("settings.service_manager", &config.settings.service_manager),
        ("python.interpreter", &config.python.interpreter),
    ];
    for (field, value) in programs {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-program",
                field,
                format!("{} must not be empty", field),
            ));
        }
    }

    if config.packages.is_empty() {
        errors.push(ValidationError::new(
            "no-packages",
            "packages",
            "packages must list at least one OS package".to_string(),
        ));
    }
    for pkg in &config.packages {
        if pkg.trim().is_empty() || pkg.starts_with('-') {
            errors.push(ValidationError::new(
                "invalid-package",
                "packages",
                format!("'{}' is not a valid package name", pkg),
            ));
        }
    }

    errors
}

fn validate_relative_paths(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let fields = config
        .data_dirs
        .iter()
        .map(|p| ("data_dirs", p.as_path()))
        .chain(config.executables.iter().map(|p| ("executables", p.as_path())))
        .chain([
            ("python.venv_dir", config.python.venv_dir.as_path()),
            ("python.requirements", config.python.requirements.as_path()),
        ]);

    for (field, path) in fields {
        if !stays_inside(path) {
            errors.push(ValidationError::new(
                "escapes-project-dir",
                field,
                format!(
                    "{} entry '{}' must be a relative path inside project_dir",
                    field,
                    path.display()
                ),
            ));
        }
    }

    errors
}

fn validate_service(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.service.unit_file.extension().and_then(|e| e.to_str()) != Some("service") {
        errors.push(ValidationError::new(
            "unit-extension",
            "service.unit_file",
            format!(
                "service.unit_file '{}' must end in .service",
                config.service.unit_file.display()
            ),
        ));
    }

    if !config.service.unit_dir.is_absolute() {
        errors.push(ValidationError::new(
            "relative-unit-dir",
            "service.unit_dir",
            format!(
                "service.unit_dir must be an absolute path, got '{}'",
                config.service.unit_dir.display()
            ),
        ));
    }

    errors
}

/// Relative, non-empty, and free of `..` components.
fn stays_inside(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Validate and return the first error as a SetupError.
pub fn validate(config: &ProvisionConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(SetupError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&ProvisionConfig::default()).is_ok());
    }

    #[test]
    fn rejects_relative_project_dir() {
        let config = ProvisionConfig {
            project_dir: PathBuf::from("pishgoo"),
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "relative-project-dir"));
    }

    #[test]
    fn rejects_parent_dir_escape() {
        let config = ProvisionConfig {
            data_dirs: vec![PathBuf::from("../etc")],
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "data_dirs");
    }

    #[test]
    fn rejects_absolute_executable() {
        let config = ProvisionConfig {
            executables: vec![PathBuf::from("/usr/bin/python3")],
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.field == "executables"));
    }

    #[test]
    fn rejects_empty_package_list() {
        let config = ProvisionConfig {
            packages: vec![],
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "no-packages"));
    }

    #[test]
    fn rejects_flag_as_package() {
        let mut config = ProvisionConfig::default();
        config.packages.push("--allow-downgrades".to_string());
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "invalid-package"));
    }

    #[test]
    fn rejects_unit_without_service_extension() {
        let mut config = ProvisionConfig::default();
        config.service.unit_file = PathBuf::from("pishgoo.conf");
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "unit-extension"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = ProvisionConfig::default();
        config.python.interpreter = String::new();
        config.service.unit_dir = PathBuf::from("systemd");
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validate_joins_messages() {
        let mut config = ProvisionConfig::default();
        config.settings.package_manager = " ".to_string();
        config.packages.clear();
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("settings.package_manager"));
        assert!(msg.contains("at least one"));
    }
}
