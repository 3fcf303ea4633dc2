use anyhow::Context;
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Map, Value};
use skinai_contracts::errors::AssessmentError;

use super::{GenerationRequest, GenerationResponse, GenerativeProvider};
use crate::config::EngineConfig;

const BODY_PREVIEW_CHARS: usize = 512;

pub struct GeminiProvider {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl GeminiProvider {
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self {
            api_base: config.gemini_api_base.clone(),
            api_key: config.gemini_api_key.clone(),
            http,
        })
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl GenerativeProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, AssessmentError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AssessmentError::NotConfigured("Gemini".to_string()));
        };
        let endpoint = self.endpoint_for_model(&request.model);
        let payload = build_payload(request);
        tracing::info!(
            model = %request.model,
            with_image = request.image.is_some(),
            prompt_chars = request.prompt.chars().count(),
            "sending Gemini generateContent request"
        );

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .map_err(|err| {
                let err = err.without_url();
                tracing::warn!(model = %request.model, "Gemini transport failure: {err}");
                AssessmentError::from_upstream(None, err.to_string())
            })?;

        let status = response.status();
        let code = status.as_u16();
        let body = response.text().map_err(|err| {
            AssessmentError::from_upstream(
                Some(code),
                format!("Gemini response body read failed: {}", err.without_url()),
            )
        })?;
        if !status.is_success() {
            tracing::warn!(
                model = %request.model,
                status = code,
                body = %truncate_text(&body, BODY_PREVIEW_CHARS),
                "Gemini request failed"
            );
            return Err(AssessmentError::from_upstream(Some(code), body));
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|err| {
            AssessmentError::MalformedResponse(format!("Gemini returned invalid JSON payload: {err}"))
        })?;
        let text = extract_text(&parsed)?;
        tracing::debug!(model = %request.model, reply = %truncate_text(&text, BODY_PREVIEW_CHARS), "Gemini reply");

        Ok(GenerationResponse {
            text,
            provider_response: json!({
                "candidates": parsed
                    .get("candidates")
                    .and_then(Value::as_array)
                    .map(|rows| rows.len())
                    .unwrap_or(0),
                "usage_metadata": parsed.get("usageMetadata").cloned().unwrap_or(Value::Null),
            }),
        })
    }
}

/// `generateContent` body: one content entry holding the prompt text and,
/// when present, the photo as an inline part after it.
pub fn build_payload(request: &GenerationRequest) -> Value {
    let mut parts = vec![json!({ "text": request.prompt })];
    if let Some(image) = request.image.as_ref() {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.data,
            }
        }));
    }

    let mut payload = Map::new();
    payload.insert(
        "contents".to_string(),
        Value::Array(vec![json!({ "parts": parts })]),
    );
    payload.insert(
        "generationConfig".to_string(),
        json!({
            "temperature": request.settings.temperature,
            "maxOutputTokens": request.settings.max_output_tokens,
        }),
    );
    Value::Object(payload)
}

/// Text of the first part of the first candidate.
pub fn extract_text(response: &Value) -> Result<String, AssessmentError> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AssessmentError::MalformedResponse(
                "response has no candidates[0].content.parts[0].text".to_string(),
            )
        })
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
