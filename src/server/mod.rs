// ============================================================
// Layer 1 — HTTP Inference Service
// ============================================================
// A second presentation surface next to the CLI. Two routes:
//
//   GET  /              → {"status":"API is running","model":...}
//   POST /predict-text  → {"input_text":...,"predicted_label":N}
//
// The predictor is built once before the server starts and is
// handed to every handler as shared axum State. Burn modules
// are not guaranteed to be Sync, so the predictor sits behind a
// Mutex and each request holds the lock only for one forward
// pass (never across an await).
//
// CORS allows one origin, any method and any header.
//
// Reference: axum 0.7 documentation (State, Json, serve)
//            tower-http CorsLayer

mod handlers;

pub use handlers::*;

use anyhow::{anyhow, Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tower_http::cors::{Any, CorsLayer};

use crate::ml::inferencer::Predictor;

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address:     SocketAddr,
    /// Single origin allowed by CORS
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address:     SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

// ─── DTOs ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub input_text:      String,
    pub predicted_label: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─── Service context ──────────────────────────────────────────────────────────
/// Everything a request needs, built once at startup.
pub struct ServiceContext<B: Backend> {
    predictor:  Mutex<Predictor<B>>,
    model_name: String,
}

impl<B: Backend> ServiceContext<B> {
    pub fn new(predictor: Predictor<B>, model_name: impl Into<String>) -> Self {
        Self { predictor: Mutex::new(predictor), model_name: model_name.into() }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn predict(&self, text: &str) -> Result<usize> {
        let predictor = self
            .predictor
            .lock()
            .map_err(|_| anyhow!("predictor lock poisoned"))?;
        predictor.predict(text)
    }
}

// ─── Router / server ──────────────────────────────────────────────────────────
pub fn router<B: Backend>(ctx: Arc<ServiceContext<B>>, cors_origin: &str) -> Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin '{cors_origin}'"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(health::<B>))
        .route("/predict-text", post(predict_text::<B>))
        .layer(cors)
        .with_state(ctx))
}

pub async fn serve<B: Backend>(config: ServerConfig, ctx: ServiceContext<B>) -> Result<()> {
    let app = router(Arc::new(ctx), &config.cors_origin)?;

    let listener = tokio::net::TcpListener::bind(config.address)
        .await
        .with_context(|| format!("Cannot bind {}", config.address))?;
    tracing::info!("Listening on http://{}", config.address);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
