// ⚠️ Risk service

use super::{ApiJson, ApiQuery, AppState};
use crate::entities::{NewRisk, Risk};
use crate::error::{Error, Result};
use crate::store::{management::aspect_exists, risk, Page};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/risks/", get(list_risks))
        .route(
            "/aspects/:aspect_id/risks/",
            get(list_aspect_risks).post(create_risk),
        )
}

/// GET /risks/
async fn list_risks(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Risk>>> {
    let page = state.page(page);
    Ok(Json(state.with_db(|conn| risk::list_risks(conn, page))?))
}

/// POST /aspects/:aspect_id/risks/
async fn create_risk(
    State(state): State<AppState>,
    Path(aspect_id): Path<i64>,
    ApiJson(new): ApiJson<NewRisk>,
) -> Result<(StatusCode, Json<Risk>)> {
    let created = state.with_db(|conn| risk::create_risk(conn, aspect_id, new))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /aspects/:aspect_id/risks/
async fn list_aspect_risks(
    State(state): State<AppState>,
    Path(aspect_id): Path<i64>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Risk>>> {
    let page = state.page(page);
    let risks = state.with_db(|conn| {
        if !aspect_exists(conn, aspect_id)? {
            return Err(Error::not_found("Aspect not found"));
        }
        risk::list_risks_for_aspect(conn, aspect_id, page)
    })?;
    Ok(Json(risks))
}

#[cfg(test)]
mod tests {
    use super::super::build_router;
    use super::super::testing::{send, state};
    use axum::http::StatusCode;
    use serde_json::json;

    async fn aspect(app: &axum::Router) -> i64 {
        let (_, body) = send(
            app,
            "POST",
            "/api/v1/aspects",
            Some(json!({
                "name": "Chemical storage",
                "description": "Solvent drums in the paint shop",
                "lifecycle_stage": "Manufacturing",
                "aspect_type": "Emission"
            })),
        )
        .await;
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_risk_lifecycle() {
        let app = build_router(state());
        let aspect_id = aspect(&app).await;
        let uri = format!("/api/v1/aspects/{}/risks/", aspect_id);

        let (status, created) = send(
            &app,
            "POST",
            &uri,
            Some(json!({
                "description": "Solvent spill into storm drain",
                "category": "Legal Compliance",
                "probability": 2,
                "impact": 5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["risk_level"], 10);

        let (_, listed) = send(&app, "GET", &uri, None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (_, all) = send(&app, "GET", "/api/v1/risks/?limit=10", None).await;
        assert_eq!(all[0]["category"], "Legal Compliance");
    }

    #[tokio::test]
    async fn test_risk_for_unknown_aspect_is_404() {
        let app = build_router(state());
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/aspects/77/risks/",
            Some(json!({
                "description": "Flooding of the warehouse",
                "category": "Physical Climate",
                "probability": 3,
                "impact": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/v1/aspects/77/risks/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_out_of_range_probability_is_422() {
        let app = build_router(state());
        let aspect_id = aspect(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/aspects/{}/risks/", aspect_id),
            Some(json!({
                "description": "Odour complaints",
                "category": "Reputational",
                "probability": 9,
                "impact": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
