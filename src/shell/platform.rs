//! Platform detection.
//!
//! Only Debian-family hosts with systemd are supported: the package steps
//! drive `apt-get` and the service step drives `systemctl`.

use crate::config::ProvisionConfig;
use crate::error::{Result, SetupError};

use super::command::find_program;

/// Check if running in a CI environment.
///
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check if running as root.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Verify the host can run the plan for `config`.
///
/// The service manager is only required when a unit file is present.
pub fn preflight(config: &ProvisionConfig) -> Result<()> {
    let mut required = vec![config.settings.package_manager.as_str()];
    if config.service_source().is_file() {
        required.push(config.settings.service_manager.as_str());
    }

    for tool in required {
        if find_program(tool).is_none() {
            return Err(SetupError::UnsupportedPlatform {
                tool: tool.to_string(),
            });
        }
    }

    if !is_elevated() {
        return Err(SetupError::NotElevated);
    }

    tracing::debug!("preflight passed");
    Ok(())
}
