// HTTP request handlers.

use axum::{extract::State, http::StatusCode, Json};
use burn::prelude::Backend;
use std::sync::Arc;

use crate::server::{ErrorResponse, HealthResponse, PredictRequest, PredictResponse, ServiceContext};

/// GET /
pub async fn health<B: Backend>(
    State(ctx): State<Arc<ServiceContext<B>>>,
) -> (StatusCode, Json<HealthResponse>) {
    let body = HealthResponse {
        status: "API is running".to_string(),
        model:  ctx.model_name().to_string(),
    };
    (StatusCode::OK, Json(body))
}

/// POST /predict-text
///
/// The forward pass runs on tokio's blocking pool.
pub async fn predict_text<B: Backend>(
    State(ctx): State<Arc<ServiceContext<B>>>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let text = payload.text.clone();
    let label = tokio::task::spawn_blocking(move || ctx.predict(&text))
        .await
        .map_err(|e| internal_error(format!("prediction task failed: {e}")))?
        .map_err(|e| internal_error(format!("{e:#}")))?;

    Ok(Json(PredictResponse {
        input_text:      payload.text,
        predicted_label: label,
    }))
}

fn internal_error(error: String) -> (StatusCode, Json<ErrorResponse>) {
    tracing::warn!("Prediction failed: {}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::inferencer::tests::tiny_predictor;
    use burn::backend::NdArray;

    fn test_state(num_labels: usize) -> Arc<ServiceContext<NdArray>> {
        Arc::new(ServiceContext::new(tiny_predictor(num_labels), "Test Classifier"))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, Json(body)) = health(State(test_state(4))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "API is running");
        assert_eq!(body.model, "Test Classifier");
    }

    #[tokio::test]
    async fn test_predict_text_echoes_input() {
        let req = PredictRequest { text: "I feel great today".to_string() };
        let Json(body) = predict_text(State(test_state(16)), Json(req)).await.unwrap();
        assert_eq!(body.input_text, "I feel great today");
        assert!(body.predicted_label < 16);
    }

    #[tokio::test]
    async fn test_predict_is_stable_across_requests() {
        let state = test_state(5);
        let a = predict_text(State(state.clone()), Json(PredictRequest { text: "so tired".into() }))
            .await
            .unwrap();
        let b = predict_text(State(state), Json(PredictRequest { text: "so tired".into() }))
            .await
            .unwrap();
        assert_eq!(a.0.predicted_label, b.0.predicted_label);
    }

    #[test]
    fn test_internal_error_body() {
        let (status, Json(body)) = internal_error("boom".to_string());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "boom");
    }
}
