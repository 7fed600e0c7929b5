//! Command-line interface for pishgoo-setup.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, ConfigArgs, PlanArgs, RunArgs};
pub use commands::{Command, CommandDispatcher, CommandResult, ConfigOverrides};
