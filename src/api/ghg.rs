// 🏭 GHG service: factor and source registries, activity ledger, inventory

use super::{ApiJson, ApiQuery, AppState};
use crate::entities::{
    ActivityData, EmissionFactor, EmissionSource, NewActivityData, NewEmissionFactor,
    NewEmissionSource,
};
use crate::error::{Error, Result};
use crate::inventory::{summarize, GhgInventory};
use crate::store::{ghg, Page};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InventoryPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/factors/", get(list_factors).post(create_factor))
        .route("/sources/", get(list_sources).post(create_source))
        .route("/activity-data/", post(create_activity))
        .route("/inventory/", get(inventory))
}

async fn create_factor(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewEmissionFactor>,
) -> Result<(StatusCode, Json<EmissionFactor>)> {
    let factor = state.with_db(|conn| ghg::create_factor(conn, new))?;
    Ok((StatusCode::CREATED, Json(factor)))
}

async fn list_factors(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<EmissionFactor>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| ghg::list_factors(conn, page))?))
}

async fn create_source(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewEmissionSource>,
) -> Result<(StatusCode, Json<EmissionSource>)> {
    let source = state.with_db(|conn| ghg::create_source(conn, new))?;
    Ok((StatusCode::CREATED, Json(source)))
}

async fn list_sources(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<EmissionSource>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| ghg::list_sources(conn, page))?))
}

async fn create_activity(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewActivityData>,
) -> Result<(StatusCode, Json<ActivityData>)> {
    let activity = state.with_db(|conn| ghg::create_activity(conn, new))?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /inventory/?start_date=..&end_date=..
async fn inventory(
    State(state): State<AppState>,
    ApiQuery(period): ApiQuery<InventoryPeriod>,
) -> Result<Json<GhgInventory>> {
    if period.start_date > period.end_date {
        return Err(Error::validation("start_date must not be after end_date"));
    }

    let entries = state.with_db(|conn| {
        ghg::list_activity_for_period(conn, period.start_date, period.end_date)
    })?;
    let summary = summarize(&entries);

    if summary.excluded > 0 || summary.unbucketed > 0 {
        tracing::warn!(
            start_date = %period.start_date,
            end_date = %period.end_date,
            excluded = summary.excluded,
            unbucketed = summary.unbucketed,
            "Inventory computed with unresolved activity rows"
        );
    }
    tracing::info!(
        rows = entries.len(),
        total_co2e = summary.inventory.total_co2e,
        "Inventory computed"
    );

    Ok(Json(summary.inventory))
}
