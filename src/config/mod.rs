//! Configuration loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use pishgoo_setup::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("provision.yml"), "project_dir: /srv/pishgoo").unwrap();
//!
//! let (config, _source) = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.project_dir, std::path::PathBuf::from("/srv/pishgoo"));
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use schema::{
    DashboardConfig, OutputMode, ProvisionConfig, PythonConfig, ServiceConfig, Settings,
};

pub use loader::{
    discover_config, load_config, load_config_file, parse_config, ConfigSource, CONFIG_FILE_NAME,
};

pub use validator::{validate, validate_config, ValidationError};
