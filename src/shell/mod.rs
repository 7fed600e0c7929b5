//! External command execution and platform checks.

pub mod command;
pub mod platform;

pub use command::{
    execute, execute_streaming, find_program, CommandOptions, CommandResult,
    CommandRunner, CommandSpec, OutputCallback, OutputLine, SystemRunner,
};
pub use platform::{is_ci, is_elevated, preflight};
