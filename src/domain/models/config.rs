use serde::{Deserialize, Serialize};

/// Main configuration structure for datamill
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Base directory all file-writing capabilities are confined to
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Directory scanned for input CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory chart images are written to
    #[serde(default = "default_plots_dir")]
    pub plots_dir: String,

    /// Directory reports are written to
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Agent tuning
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_plots_dir() -> String {
    "plots".to_string()
}

fn default_reports_dir() -> String {
    "reports".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            data_dir: default_data_dir(),
            plots_dir: default_plots_dir(),
            reports_dir: default_reports_dir(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` session database
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".datamill/datamill.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional log file; when set, logs go to both stderr and this file
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// Agent tuning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Maximum capability invocations per task
    #[serde(default = "default_iteration_cap")]
    pub iteration_cap: usize,

    /// Bounded conversation history length per agent
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

const fn default_iteration_cap() -> usize {
    20
}

const fn default_history_limit() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            iteration_cap: default_iteration_cap(),
            history_limit: default_history_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.plots_dir, "plots");
        assert_eq!(config.reports_dir, "reports");
        assert_eq!(config.database.path, ".datamill/datamill.db");
        assert_eq!(config.agent.iteration_cap, 20);
        assert_eq!(config.agent.history_limit, 10);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "data_dir: incoming\nagent:\n  iteration_cap: 5\n";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.data_dir, "incoming");
        assert_eq!(config.agent.iteration_cap, 5);
        assert_eq!(config.agent.history_limit, 10);
        assert_eq!(config.plots_dir, "plots");
    }
}
