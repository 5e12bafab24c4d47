//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading (.datamill/config.yaml, .datamill/local.yaml)
//! - `DATAMILL_*` environment variable overrides
//! - Post-load validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
