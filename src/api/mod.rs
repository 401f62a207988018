// 🌐 REST API
// One axum router per service, all sharing the same state. A process mounts the
// services named in its configuration under `/api/v1`.

pub mod management;
pub mod ai;
pub mod risk;
pub mod compliance;
pub mod objectives;
pub mod audit;
pub mod ghg;
pub mod reporting;

use crate::classifier::AspectClassifier;
use crate::config::{Config, ServiceKind};
use crate::error::{Error, Result};
use crate::http_client::{ServiceClient, ServiceError};
use crate::reporting::ReportSources;
use crate::store::Page;
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// ============================================================================
// STATE
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<Config>,
    pub classifier: Arc<dyn AspectClassifier>,
    /// Present when core is mounted and AI classification is enabled
    pub ai_client: Option<ServiceClient>,
    /// Present when reporting is mounted
    pub report_sources: Option<ReportSources>,
}

impl AppState {
    pub fn new(
        conn: Connection,
        config: Config,
        classifier: Arc<dyn AspectClassifier>,
    ) -> std::result::Result<Self, ServiceError> {
        let ai_client = if config.enable_ai_classification && config.serves(ServiceKind::Core) {
            Some(ServiceClient::new("ai", &config.urls.ai, &config.client)?)
        } else {
            None
        };
        let report_sources = if config.serves(ServiceKind::Reporting) {
            Some(ReportSources::from_config(&config)?)
        } else {
            None
        };

        Ok(AppState {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            classifier,
            ai_client,
            report_sources,
        })
    }

    /// Run `f` with the database connection held. Never call this across an `.await`.
    pub fn with_db<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        f(&conn)
    }

    /// Clamp a requested page to the configured maximum.
    pub fn page(&self, page: Page) -> Page {
        page.clamped(self.config.max_page_size)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Validation(_) | Error::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Service(ServiceError::Unavailable { .. })
            | Error::Service(ServiceError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Service(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// `Json` extractor whose rejections use the `{"detail"}` error body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(Error::validation(rejection.body_text())),
        }
    }
}

/// `Query` extractor whose rejections use the `{"detail"}` error body.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(Error::validation(rejection.body_text())),
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// GET / - Health check
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let names: Vec<&str> = state.config.services.iter().map(|s| s.as_str()).collect();
    Json(json!({ "status": "ok", "service": names.join(",") }))
}

fn service_router(kind: ServiceKind) -> Router<AppState> {
    match kind {
        ServiceKind::Core => management::router(),
        ServiceKind::Ai => ai::router(),
        ServiceKind::Risk => risk::router(),
        ServiceKind::Compliance => compliance::router(),
        ServiceKind::Objectives => objectives::router(),
        ServiceKind::Audit => audit::router(),
        ServiceKind::Ghg => ghg::router(),
        ServiceKind::Reporting => reporting::router(),
    }
}

/// Build the application for the services listed in the state's configuration.
pub fn build_router(state: AppState) -> Router {
    let mut api = Router::new().route("/", get(health));
    for kind in state.config.services.iter().copied() {
        api = api.merge(service_router(kind));
    }

    Router::new()
        .route("/", get(health))
        .nest("/api/v1", api)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %uuid::Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// TEST HELPERS
// ============================================================================
