// 📄 Reporting service

use super::{ApiJson, AppState};
use crate::error::{Error, Result};
use crate::reporting::{self, ReportRequest};
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/reports/sustainability", post(sustainability_report))
}

/// POST /reports/sustainability
async fn sustainability_report(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReportRequest>,
) -> Result<Json<Value>> {
    let sources = state
        .report_sources
        .as_ref()
        .ok_or_else(|| Error::not_found("Reporting service is not enabled"))?;

    let markdown = reporting::generate(sources, &request).await?;
    Ok(Json(json!({ "report_markdown": markdown })))
}
