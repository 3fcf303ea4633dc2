mod config;
mod error;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use skinai_contracts::events::EventWriter;
use skinai_engine::config::{init_tracing, EngineConfig};
use skinai_engine::AssessmentEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AssessmentEngine>,
}

fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/ai/disease-detection", post(handlers::disease_detection))
        .route("/api/ai/health-chat", post(handlers::health_chat))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("skinai-server error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    init_tracing(&config.log_level);

    // The engine owns blocking HTTP clients, which must be created and
    // dropped outside the async runtime.
    let mut engine = AssessmentEngine::from_config(EngineConfig::from_env()?)?;
    if let Some(path) = config.events_path.as_ref() {
        let session_id = format!("server-{}", std::process::id());
        engine = engine.with_events(EventWriter::new(path, session_id));
    }
    tracing::info!(
        assessment_model = engine.assessment_model(),
        chat_model = engine.chat_model(),
        api_key_configured = engine.config().gemini_api_key.is_some(),
        "engine ready"
    );
    let state = AppState {
        engine: Arc::new(engine),
    };
    let app = build_router(state.clone(), config.max_body_bytes);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let served = runtime.block_on(async {
        let addr = config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(%addr, "listening");
        axum::serve(listener, app).await.context("server error")
    });
    drop(runtime);
    drop(state);
    served
}
