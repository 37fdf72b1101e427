//! Process configuration read from environment variables.

use activity_core::{default_log_level, LogTarget};
use anyhow::{anyhow, Context};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "activity_tracker.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8089;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_target: LogTarget,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let port = match value("APP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("APP_PORT must be a port number, got `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        let log_target = match value("LOG_DIR") {
            Some(dir) => LogTarget::directory(&dir).map_err(|err| anyhow!("LOG_DIR: {err}"))?,
            None => LogTarget::Stderr,
        };

        Ok(Self {
            db_path: value("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            host: value("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            log_level: value("LOG_LEVEL").unwrap_or_else(|| default_log_level().into()),
            log_target,
        })
    }

    /// `host:port` string handed to the listener; hostnames are resolved there.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
