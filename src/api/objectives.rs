// 🎯 Objectives service

use super::{ApiJson, ApiQuery, AppState};
use crate::entities::{Indicator, NewIndicator, NewObjective, Objective};
use crate::error::Result;
use crate::store::{objectives, Page};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/objectives/", get(list_objectives).post(create_objective))
        .route("/objectives/:objective_id/indicators/", post(create_indicator))
}

async fn create_objective(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewObjective>,
) -> Result<(StatusCode, Json<Objective>)> {
    let objective = state.with_db(|conn| objectives::create_objective(conn, new))?;
    Ok((StatusCode::CREATED, Json(objective)))
}

async fn list_objectives(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Objective>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| objectives::list_objectives(conn, page))?))
}

async fn create_indicator(
    State(state): State<AppState>,
    Path(objective_id): Path<i64>,
    ApiJson(new): ApiJson<NewIndicator>,
) -> Result<(StatusCode, Json<Indicator>)> {
    let indicator = state.with_db(|conn| objectives::create_indicator(conn, objective_id, new))?;
    Ok((StatusCode::CREATED, Json(indicator)))
}
