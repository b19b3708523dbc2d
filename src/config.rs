use anyhow::{Context, Result, ensure};
use std::{env, path::PathBuf, time::Duration};

/// Console configuration loaded from the environment
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Device firmware endpoint configuration
    pub device: DeviceConfig,

    /// Session storage configuration
    pub session: SessionConfig,
}

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    /// Base prepended to relative request paths
    pub base_url: String,
    /// Timeout applied to every GET and POST
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub dir: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: DeviceConfig::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DeviceConfig::DEFAULT_TIMEOUT_MS),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from environment variables
    pub fn load() -> Result<Self> {
        Ok(Self {
            device: DeviceConfig::load()?,
            session: SessionConfig::load(),
        })
    }
}

impl DeviceConfig {
    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1";
    pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

    fn load() -> Result<Self> {
        let base_url =
            env::var("CONSOLE_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());

        let timeout_ms = match env::var("CONSOLE_TIMEOUT_MS") {
            Ok(value) => value
                .parse::<u64>()
                .context("failed to parse CONSOLE_TIMEOUT_MS: invalid format")?,
            Err(_) => Self::DEFAULT_TIMEOUT_MS,
        };

        Self::new(base_url, Duration::from_millis(timeout_ms))
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();

        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "failed to use base url {base_url:?}: scheme must be http or https"
        );
        ensure!(!timeout.is_zero(), "failed to use timeout: must not be zero");

        Ok(Self { base_url, timeout })
    }
}

impl SessionConfig {
    fn load() -> Self {
        let dir = env::var("CONSOLE_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_dir());

        Self { dir }
    }

    pub fn default_dir() -> PathBuf {
        env::temp_dir().join(concat!(env!("CARGO_PKG_NAME"), "-session"))
    }
}
