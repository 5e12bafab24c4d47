//! CLI command implementations.

pub mod init;
pub mod plan;
pub mod run;
pub mod session;

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load configuration from an explicit file or the project hierarchy.
pub(crate) fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
