//! Parsing and validation of `graft.toml` project configuration files.
//!
//! This crate reads the project configuration file, interpolates environment
//! variables, validates it once at the boundary and produces a strongly-typed
//! [`ResolvedConfig`] the code generator consumes without re-checking.

#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_file, load_config_from_str, load_config_with_env, LoadedConfig,
    CONFIG_FILE,
};
pub use resolve::{resolve_config, ResolvedConfig};
pub use types::*;
