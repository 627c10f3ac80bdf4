//! Parsing and validation of `tally.toml` configuration files.
//!
//! The configuration names where the outputs snapshot lives, how it is
//! encoded, and the output base that local artifact paths resolve against.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
