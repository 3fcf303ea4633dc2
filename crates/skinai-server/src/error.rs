use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use skinai_contracts::errors::{AssessmentError, ErrorResponse};

/// Which endpoint failed. Chat failures still carry a fallback reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Analysis,
    Chat,
}

#[derive(Debug)]
pub struct ApiError {
    pub endpoint: Endpoint,
    pub error: AssessmentError,
}

impl ApiError {
    pub fn analysis(error: AssessmentError) -> Self {
        Self {
            endpoint: Endpoint::Analysis,
            error,
        }
    }

    pub fn chat(error: AssessmentError) -> Self {
        Self {
            endpoint: Endpoint::Chat,
            error,
        }
    }

    pub fn rejected(endpoint: Endpoint, rejection: JsonRejection) -> Self {
        Self {
            endpoint,
            error: AssessmentError::Validation(rejection.body_text()),
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match self.endpoint {
            Endpoint::Analysis => self.error.analysis_response(),
            Endpoint::Chat => self.error.chat_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match self.endpoint {
            Endpoint::Analysis => self.error.http_status(),
            Endpoint::Chat => self.error.chat_http_status(),
        };
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::warn!(
            kind = self.error.kind().code(),
            status = status.as_u16(),
            "request failed: {}",
            self.error
        );
        (status, Json(self.body())).into_response()
    }
}
