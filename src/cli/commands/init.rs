//! Implementation of the `datamill init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing .datamill/config.yaml
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub initialized_path: PathBuf,
    pub config_written: bool,
    pub directories_created: Vec<String>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Initialized {}", self.initialized_path.display())];
        if self.config_written {
            lines.push("  wrote .datamill/config.yaml".to_string());
        } else {
            lines.push("  kept existing .datamill/config.yaml".to_string());
        }
        for dir in &self.directories_created {
            lines.push(format!("  created {dir}/"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json: bool) -> Result<()> {
    let base = args.path.as_path();
    let config = Config::default();

    let config_dir = base.join(".datamill");
    fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("cannot create {}", config_dir.display()))?;

    let config_path = config_dir.join("config.yaml");
    let config_written = args.force || !config_path.exists();
    if config_written {
        let yaml = serde_yaml::to_string(&config).context("cannot serialize default config")?;
        fs::write(&config_path, yaml)
            .await
            .with_context(|| format!("cannot write {}", config_path.display()))?;
    }

    let mut directories_created = Vec::new();
    for dir in [&config.data_dir, &config.plots_dir, &config.reports_dir] {
        if ensure_dir(base, dir).await? {
            directories_created.push(dir.clone());
        }
    }

    output(
        &InitOutput {
            initialized_path: args.path,
            config_written,
            directories_created,
        },
        json,
    );
    Ok(())
}

async fn ensure_dir(base: &Path, dir: &str) -> Result<bool> {
    let path = base.join(dir);
    if path.exists() {
        return Ok(false);
    }
    fs::create_dir_all(&path)
        .await
        .with_context(|| format!("cannot create {}", path.display()))?;
    Ok(true)
}
