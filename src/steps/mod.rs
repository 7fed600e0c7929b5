//! Provisioning steps.
//!
//! - [`Step`] / [`StepAction`] - typed plan entries
//! - [`build_plan`] - the fixed ten-step plan for a configuration
//! - [`execute_step`] - run one step against the host
//!
//! # Example
//!
//! ```
//! use pishgoo_setup::config::ProvisionConfig;
//! use pishgoo_setup::steps::build_plan;
//!
//! let plan = build_plan(&ProvisionConfig::default());
//! assert_eq!(plan.first().map(|s| s.id), Some("update-index"));
//! assert_eq!(plan.last().map(|s| s.id), Some("next-steps"));
//! ```

pub mod executor;
pub mod plan;
pub mod step;

pub use executor::{execute_step, ExecutionOptions, StepResult, StepStatus};
pub use plan::{build_plan, STEP_IDS};
pub use step::{Step, StepAction};
