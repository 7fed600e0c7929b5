//! pishgoo-setup - Host provisioning for the Pishgoo trading application.
//!
//! Prepares a Debian/Ubuntu host with systemd to run Pishgoo: OS packages,
//! a Python virtual environment with the project's dependencies, data
//! directories, executable entry points and the optional systemd unit.
//! The steps run in a fixed order and stop at the first failure.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Optional `provision.yml` loading and validation
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Fail-fast execution of the plan and the run report
//! - [`shell`] - External command execution and platform checks
//! - [`steps`] - The provisioning plan and single-step execution
//! - [`ui`] - Spinners, prompts, and terminal output
//!
//! # Example
//!
//! ```
//! use pishgoo_setup::config::ProvisionConfig;
//! use pishgoo_setup::steps::build_plan;
//!
//! let plan = build_plan(&ProvisionConfig::default());
//! assert_eq!(plan.len(), 10);
//! assert_eq!(plan[0].describe(), vec!["apt-get update".to_string()]);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{Result, SetupError};
