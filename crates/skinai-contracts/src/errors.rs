use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const QUOTA_MESSAGE: &str =
    "AI analysis temporarily unavailable due to high demand. Please try again in a few minutes.";
pub const CHAT_UNAVAILABLE: &str = "AI service unavailable";
pub const CHAT_FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble responding right now. Please try again in a moment.";
pub const CHAT_NOT_CONFIGURED_REPLY: &str =
    "I apologize, but I'm currently unable to respond due to a configuration issue. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocalValidation,
    UpstreamUnavailable,
    QuotaExceeded,
    MalformedAiResponse,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::LocalValidation => "local_validation",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::QuotaExceeded => "quota_exceeded",
            Self::MalformedAiResponse => "malformed_ai_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssessmentError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{0} API key not configured")]
    NotConfigured(String),

    #[error("upstream quota or rate limit exhausted: {details}")]
    QuotaExceeded { details: String },

    #[error("upstream request failed{}: {body}", status_suffix(.status))]
    Upstream { status: Option<u16>, body: String },

    #[error("malformed AI response: {0}")]
    MalformedResponse(String),
}

impl AssessmentError {
    /// Classifies a failed upstream exchange. Quota and rate-limit wording in
    /// the body marks the failure as temporary.
    pub fn from_upstream(status: Option<u16>, body: impl Into<String>) -> Self {
        let body = body.into();
        if is_quota_message(&body) {
            return Self::QuotaExceeded { details: body };
        }
        Self::Upstream { status, body }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::LocalValidation,
            Self::NotConfigured(_) | Self::Upstream { .. } => ErrorKind::UpstreamUnavailable,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Self::MalformedResponse(_) => ErrorKind::MalformedAiResponse,
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    pub fn http_status(&self) -> u16 {
        if self.is_quota() {
            429
        } else {
            500
        }
    }

    /// Body returned to callers of the assessment endpoint.
    pub fn analysis_response(&self) -> ErrorResponse {
        match self {
            Self::Validation(message) => ErrorResponse::new("Invalid analysis request")
                .with_details(message.clone()),
            Self::NotConfigured(provider) => {
                ErrorResponse::new(format!("{provider} API key not configured")).with_details(
                    format!("Please configure the {} API key.", provider.to_ascii_uppercase()),
                )
            }
            Self::QuotaExceeded { .. } => ErrorResponse {
                error: QUOTA_MESSAGE.to_string(),
                details: Some("Rate limit exceeded".to_string()),
                is_quota_error: Some(true),
                response: None,
            },
            Self::Upstream {
                status: Some(_),
                body,
            } => ErrorResponse::new("AI analysis failed").with_details(body.clone()),
            Self::Upstream { status: None, body } => {
                ErrorResponse::new("Failed to analyze image with AI").with_details(body.clone())
            }
            Self::MalformedResponse(message) => {
                ErrorResponse::new("Failed to parse AI analysis").with_details(message.clone())
            }
        }
    }

    /// Chat failures are all reported as 500, quota included.
    pub fn chat_http_status(&self) -> u16 {
        500
    }

    /// Body returned to callers of the chat endpoint. Every failure collapses
    /// into one user-safe reply; `details` carries only the error kind.
    pub fn chat_response(&self) -> ErrorResponse {
        let reply = match self {
            Self::NotConfigured(_) => CHAT_NOT_CONFIGURED_REPLY,
            _ => CHAT_FALLBACK_REPLY,
        };
        ErrorResponse {
            error: CHAT_UNAVAILABLE.to_string(),
            details: Some(self.kind().code().to_string()),
            is_quota_error: None,
            response: Some(reply.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_quota_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            is_quota_error: None,
            response: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({code})")).unwrap_or_default()
}

pub fn is_quota_message(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    lowered.contains("quota") || lowered.contains("rate limit")
}
