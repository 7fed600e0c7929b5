//! Provisioning run orchestration.

pub mod provision;

pub use provision::{ProvisionRunner, RunOptions, RunProgress, RunReport, StepFailure};
