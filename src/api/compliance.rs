// ⚖️ Compliance service

use super::{ApiJson, ApiQuery, AppState};
use crate::entities::{ComplianceObligation, NewObligation};
use crate::error::Result;
use crate::store::{compliance, Page};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/obligations/", get(list_obligations).post(create_obligation))
        .route(
            "/aspects/:aspect_id/obligations/:obligation_id",
            post(link_obligation),
        )
}

async fn create_obligation(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewObligation>,
) -> Result<(StatusCode, Json<ComplianceObligation>)> {
    let obligation = state.with_db(|conn| compliance::create_obligation(conn, new))?;
    Ok((StatusCode::CREATED, Json(obligation)))
}

async fn list_obligations(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<ComplianceObligation>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| compliance::list_obligations(conn, page))?))
}

async fn link_obligation(
    State(state): State<AppState>,
    Path((aspect_id, obligation_id)): Path<(i64, i64)>,
) -> Result<Json<ComplianceObligation>> {
    let obligation = state
        .with_db(|conn| compliance::link_obligation_to_aspect(conn, aspect_id, obligation_id))?;
    Ok(Json(obligation))
}
