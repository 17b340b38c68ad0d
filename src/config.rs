// ⚙️ Configuration
// Optional TOML file; every value has a default and CLI flags override it

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

// set while a full-screen UI owns the terminal
static STDERR_LOGS_PAUSED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// EJ dataset, one row per census tract
    pub csv_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set
    pub filter: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { csv_path: PathBuf::from("ej_nc.csv") }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:3000".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string() }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Config file when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, csv_path: Option<PathBuf>, bind_address: Option<String>) -> Self {
        if let Some(csv_path) = csv_path {
            self.data.csv_path = csv_path;
        }
        if let Some(bind_address) = bind_address {
            self.server.bind_address = bind_address;
        }
        self
    }
}

/// Install the global `tracing` subscriber (stderr, env-filtered)
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_writer)
        .try_init();
}

fn log_writer() -> Box<dyn Write> {
    if stderr_logs_paused() {
        Box::new(io::sink())
    } else {
        Box::new(io::stderr())
    }
}

pub fn stderr_logs_paused() -> bool {
    STDERR_LOGS_PAUSED.load(Ordering::Relaxed)
}

/// Discards log output until the returned guard is dropped
pub fn pause_stderr_logs() -> StderrLogPause {
    STDERR_LOGS_PAUSED.store(true, Ordering::Relaxed);
    StderrLogPause { _private: () }
}

#[must_use = "logging resumes as soon as the guard is dropped"]
pub struct StderrLogPause {
    _private: (),
}

impl Drop for StderrLogPause {
    fn drop(&mut self) {
        STDERR_LOGS_PAUSED.store(false, Ordering::Relaxed);
    }
}
