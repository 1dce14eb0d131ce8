//! Centralized configuration management for lexharvest

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

use crate::downloader::{cellar, normattiva};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for downloaded documents
    pub download_dir: PathBuf,
    /// Directory for per-run summary and failed-id files
    pub log_dir: PathBuf,
    /// Number of download workers (1 = sequential)
    pub workers: usize,
    /// Remote repository endpoints
    pub endpoints: Endpoints,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Base URLs of the remote repositories
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Publications Office Cellar resource endpoint, identifiers are appended verbatim
    pub cellar_base_url: String,
    /// Normattiva portal root
    pub normattiva_base_url: String,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            cellar_base_url: cellar::BASE_URL.to_string(),
            normattiva_base_url: normattiva::BASE_URL.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "lexharvest/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: "./downloads".into(),
            log_dir: "./logs".into(),
            workers: 1,
            endpoints: Endpoints::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let download_dir = std::env::var("LEXHARVEST_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.download_dir);

        let log_dir = std::env::var("LEXHARVEST_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);

        let workers = parse_env_var("LEXHARVEST_WORKERS")?.unwrap_or(defaults.workers);

        let endpoints = Endpoints {
            cellar_base_url: std::env::var("LEXHARVEST_CELLAR_BASE_URL")
                .unwrap_or(defaults.endpoints.cellar_base_url),
            normattiva_base_url: std::env::var("LEXHARVEST_NORMATTIVA_BASE_URL")
                .unwrap_or(defaults.endpoints.normattiva_base_url),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("LEXHARVEST_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("LEXHARVEST_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            download_dir,
            log_dir,
            workers,
            endpoints,
            http,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Worker count must be at least 1"));
        }

        std::fs::create_dir_all(&self.download_dir)
            .with_context(|| format!("Cannot create download directory: {}", self.download_dir.display()))?;

        std::fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("Cannot create log directory: {}", self.log_dir.display()))?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
