use crate::error::{Result, SurfaceError};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Where surfaces come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Options chains from the market data source, synthetic surface on failure
    Live,
    /// Synthetic surface only
    Simulated,
}

impl FromStr for SourceMode {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "live" => Ok(SourceMode::Live),
            "simulated" | "sim" => Ok(SourceMode::Simulated),
            other => Err(SurfaceError::ConfigError(format!(
                "SURFACE_SOURCE must be 'live' or 'simulated', got '{}'",
                other
            ))),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Yahoo Finance endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct YahooConfig {
    /// Base URL, without the `/v7/finance` suffix
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    pub source: SourceMode,
    /// Surface collaborator failures as errors instead of falling back
    pub strict: bool,
    /// Upper bound on expiries fetched per request
    pub max_expiries: usize,
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub yahoo: YahooConfig,
    pub surface: SurfaceConfig,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, applying defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "SERVER_PORT", 3001u16)?;

        let base_url = lookup("YAHOO_BASE_URL")
            .unwrap_or_else(|| "https://query2.finance.yahoo.com".to_string());
        let timeout_secs = parse_or(&lookup, "YAHOO_TIMEOUT_SECS", 10u64)?;

        let source = match lookup("SURFACE_SOURCE") {
            Some(v) => v.parse()?,
            None => SourceMode::Simulated,
        };
        let strict = match lookup("SURFACE_STRICT") {
            Some(v) => parse_flag("SURFACE_STRICT", &v)?,
            None => false,
        };
        let max_expiries = parse_or(&lookup, "SURFACE_MAX_EXPIRIES", 10usize)?;
        if max_expiries == 0 {
            return Err(SurfaceError::ConfigError(
                "SURFACE_MAX_EXPIRIES must be at least 1".to_string(),
            ));
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            server: ServerConfig { host, port },
            yahoo: YahooConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout_secs,
            },
            surface: SurfaceConfig {
                source,
                strict,
                max_expiries,
            },
            log_level,
        })
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| SurfaceError::ConfigError(format!("Failed to init logging: {}", e)))?;

        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SurfaceError::ConfigError(format!(
            "{} must be true or false, got '{}'",
            key, raw
        ))),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            SurfaceError::ConfigError(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}
