use std::env;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ASSESSMENT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_PROFILE_API_BASE: &str = "http://localhost:4000";

/// Fixed sampling settings for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

pub const ASSESSMENT_GENERATION: GenerationSettings = GenerationSettings {
    temperature: 0.3,
    max_output_tokens: 1000,
};

pub const CHAT_GENERATION: GenerationSettings = GenerationSettings {
    temperature: 0.7,
    max_output_tokens: 500,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub assessment_model: String,
    pub chat_model: String,
    /// `None` leaves upstream calls unbounded.
    pub request_timeout: Option<Duration>,
    pub profile_api_base: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            assessment_model: DEFAULT_ASSESSMENT_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: None,
            profile_api_base: DEFAULT_PROFILE_API_BASE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads the process environment after a best-effort `.env` load.
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
        let defaults = Self::default();

        let request_timeout = match read("SKINAI_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("invalid SKINAI_REQUEST_TIMEOUT_SECS '{raw}'"))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            gemini_api_key: read("GEMINI_API_KEY").or_else(|| read("GOOGLE_API_KEY")),
            gemini_api_base: read("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_api_base),
            assessment_model: read("SKINAI_ASSESSMENT_MODEL").unwrap_or(defaults.assessment_model),
            chat_model: read("SKINAI_CHAT_MODEL").unwrap_or(defaults.chat_model),
            request_timeout,
            profile_api_base: read("SKINAI_PROFILE_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.profile_api_base),
        })
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`, which
/// wins over `default_level`. Output goes to stderr.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
