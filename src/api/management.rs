// 🏛️ Core service: policy and environmental aspects

use super::{ApiJson, ApiQuery, AppState};
use crate::classifier::Classification;
use crate::entities::{EnvironmentalAspect, EnvironmentalPolicy, NewAspect, NewPolicy};
use crate::error::{Error, Result};
use crate::store::{management, Page};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/policy", get(get_policy).post(upsert_policy))
        .route("/aspects", get(list_aspects).post(create_aspect))
        .route("/aspects/:aspect_id", get(get_aspect))
}

/// GET /policy
async fn get_policy(State(state): State<AppState>) -> Result<Json<EnvironmentalPolicy>> {
    let policy = state
        .with_db(management::get_policy)?
        .ok_or_else(|| Error::not_found("Environmental policy not defined"))?;
    Ok(Json(policy))
}

/// POST /policy - create or replace
async fn upsert_policy(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewPolicy>,
) -> Result<(StatusCode, Json<EnvironmentalPolicy>)> {
    let policy = state.with_db(|conn| management::upsert_policy(conn, new))?;
    Ok((StatusCode::CREATED, Json(policy)))
}

/// Ask the AI service for a better aspect type. Any failure keeps the submitted one.
async fn suggest_aspect_type(state: &AppState, new: &mut NewAspect) {
    let Some(client) = state.ai_client.as_ref() else {
        return;
    };

    let body = json!({ "text": new.description });
    match client
        .post_json::<_, Classification>("/analyze/aspect_type", &body)
        .await
    {
        Ok(suggestion) => {
            tracing::info!(
                submitted = %new.aspect_type,
                suggested = %suggestion.suggested_category,
                confidence = suggestion.confidence_score,
                "Aspect type classified"
            );
            new.aspect_type = suggestion.suggested_category;
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                "AI classification unavailable, keeping submitted aspect type"
            );
        }
    }
}

/// POST /aspects
async fn create_aspect(
    State(state): State<AppState>,
    ApiJson(mut new): ApiJson<NewAspect>,
) -> Result<(StatusCode, Json<EnvironmentalAspect>)> {
    new.validate()?;
    suggest_aspect_type(&state, &mut new).await;

    let aspect = state.with_db(|conn| management::create_aspect(conn, new))?;
    Ok((StatusCode::CREATED, Json(aspect)))
}

/// GET /aspects
async fn list_aspects(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<EnvironmentalAspect>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| management::list_aspects(conn, page))?))
}

/// GET /aspects/:aspect_id
async fn get_aspect(
    State(state): State<AppState>,
    Path(aspect_id): Path<i64>,
) -> Result<Json<EnvironmentalAspect>> {
    let aspect = state
        .with_db(|conn| management::get_aspect(conn, aspect_id))?
        .ok_or_else(|| Error::not_found("Aspect not found"))?;
    Ok(Json(aspect))
}
