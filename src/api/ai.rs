// 🤖 AI service: aspect type suggestion

use super::{ApiJson, AppState};
use crate::classifier::Classification;
use crate::error::Result;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze/aspect_type", post(analyze_aspect_type))
}

/// POST /analyze/aspect_type
async fn analyze_aspect_type(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<Classification>> {
    let classification = state.classifier.classify(&request.text)?;
    Ok(Json(classification))
}
