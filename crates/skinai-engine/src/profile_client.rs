use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use skinai_contracts::profile::{ProfileSnapshot, ProfileSource};

use crate::config::EngineConfig;

/// Bearer-token client for the account service's profile endpoint.
pub struct HttpProfileClient {
    api_base: String,
    http: HttpClient,
}

impl HttpProfileClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build profile HTTP client")?;
        Ok(Self {
            api_base: config.profile_api_base.clone(),
            http,
        })
    }

    pub fn profile_url(&self) -> String {
        format!("{}/api/profiles/me", self.api_base)
    }
}

impl ProfileSource for HttpProfileClient {
    fn fetch_profile(&self, token: &str) -> Result<ProfileSnapshot> {
        let url = self.profile_url();
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token.trim()))
            .send()
            .with_context(|| format!("profile request failed ({url})"))?;
        let status = response.status();
        let body = response
            .text()
            .context("profile response body read failed")?;
        if !status.is_success() {
            bail!(
                "profile request failed ({}): {}",
                status.as_u16(),
                error_message(&body)
            );
        }
        serde_json::from_str(&body).context("profile service returned an unexpected payload")
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
