//! Infrastructure layer module
//!
//! This module contains infrastructure concerns behind the engine:
//! - Configuration management (figment)
//! - Logging (tracing-subscriber, optional file appender)
//!
//! Storage and capability implementations live under `adapters`.

pub mod config;
pub mod logging;
