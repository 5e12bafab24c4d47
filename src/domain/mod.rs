//! Domain layer for the datamill pipeline engine
//!
//! This module contains core business logic and domain models.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CapabilityError, OrchestrationError, RegistryError};
