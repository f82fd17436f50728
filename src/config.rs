use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::Database;
use crate::pipeline::{Pipeline, SplitMode};

/// Origins allowed to call the API from a browser, besides any
/// `http://localhost:<port>` / `http://127.0.0.1:<port>` origin.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:5175",
    "http://127.0.0.1:5175",
    "https://sql-runner-hazel.vercel.app",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file shared by every request
    pub db_path: PathBuf,
    /// Address the HTTP server listens on
    pub bind: String,
    /// Skip bearer-token inspection entirely
    pub allow_unauth: bool,
    pub allowed_origins: Vec<String>,
    pub split_mode: SplitMode,
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("sql_runner.db"),
            bind: String::from("127.0.0.1:8000"),
            allow_unauth: false,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            split_mode: SplitMode::default(),
            busy_timeout_ms: 5000,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlrunner")
            .join("config.toml")
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn database(&self) -> Database {
        Database::new(&self.db_path).with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.database(), self.split_mode)
    }
}
