// 🔍 Audit service

use super::{ApiJson, ApiQuery, AppState};
use crate::entities::{Audit, AuditFinding, NewAudit, NewFinding};
use crate::error::Result;
use crate::store::{audit, Page};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/audits/", get(list_audits).post(create_audit))
        .route("/audits/:audit_id/findings/", post(create_finding))
}

async fn create_audit(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewAudit>,
) -> Result<(StatusCode, Json<Audit>)> {
    let created = state.with_db(|conn| audit::create_audit(conn, new))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_audits(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Audit>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| audit::list_audits(conn, page))?))
}

async fn create_finding(
    State(state): State<AppState>,
    Path(audit_id): Path<i64>,
    ApiJson(new): ApiJson<NewFinding>,
) -> Result<(StatusCode, Json<AuditFinding>)> {
    let finding = state.with_db(|conn| audit::create_finding(conn, audit_id, new))?;
    Ok((StatusCode::CREATED, Json(finding)))
}
