//! Parsing and validation of `mvnet.toml` engine configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`EngineConfig`] with network limits, global composition settings, and
//! the optimization passes to run.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::*;
