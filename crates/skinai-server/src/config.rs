use std::env;
use std::path::PathBuf;

use anyhow::Context;

/// Largest accepted request body. Photos arrive base64-encoded inside JSON.
pub const DEFAULT_MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub events_path: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid PORT '{raw}'"))?,
            None => 4000,
        };
        let max_body_bytes = match read("MAX_BODY_BYTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid MAX_BODY_BYTES '{raw}'"))?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            host: read("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: read("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            events_path: read("SKINAI_EVENTS_PATH").map(PathBuf::from),
            max_body_bytes,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
