use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use skinai_contracts::assessment::{AssessmentRequest, AssessmentResult};
use skinai_contracts::chat::{ChatReply, ChatRequest};
use skinai_contracts::errors::AssessmentError;

use crate::error::{ApiError, Endpoint};
use crate::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

pub async fn disease_detection(
    State(state): State<AppState>,
    body: Result<Json<AssessmentRequest>, JsonRejection>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::rejected(Endpoint::Analysis, rejection))?;
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.assess(&request))
        .await
        .map_err(|err| ApiError::analysis(worker_failed(err)))?
        .map_err(ApiError::analysis)?;
    Ok(Json(result))
}

pub async fn health_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::rejected(Endpoint::Chat, rejection))?;
    let engine = state.engine.clone();
    let reply = tokio::task::spawn_blocking(move || engine.chat(&request))
        .await
        .map_err(|err| ApiError::chat(worker_failed(err)))?
        .map_err(ApiError::chat)?;
    Ok(Json(reply))
}

fn worker_failed(err: tokio::task::JoinError) -> AssessmentError {
    AssessmentError::Upstream {
        status: None,
        body: format!("worker task failed: {err}"),
    }
}
