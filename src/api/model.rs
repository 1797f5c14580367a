//! Model info endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::services::SUPPORTED_GENRES;
use crate::AppState;

/// Model info response
#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    /// Identifier of the classification model in use
    pub model: String,
    /// Labels the model can produce
    pub genres: Vec<&'static str>,
    /// Longest clip the classifier handles well, in seconds
    pub max_duration_secs: u64,
}

/// GET /api/v1/model
async fn model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    Json(ModelInfoResponse {
        model: state.config.classifier_model.clone(),
        genres: SUPPORTED_GENRES.to_vec(),
        max_duration_secs: 300,
    })
}

/// Build model info routes
pub fn model_routes() -> Router<AppState> {
    Router::new().route("/api/v1/model", get(model_info))
}
