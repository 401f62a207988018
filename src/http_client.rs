// 🔌 Inter-service HTTP client
// JSON over reqwest with a per-request timeout, bounded retries with exponential
// backoff, and a circuit breaker shared by every clone of the client.

use crate::config::ClientSettings;
use crate::logging::log_api_call;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Connection failed or the circuit breaker is open.
    #[error("{service} service unavailable: {message}")]
    Unavailable { service: String, message: String },

    #[error("{service} service timed out")]
    Timeout { service: String },

    /// The target rejected the request (4xx).
    #[error("{service} service rejected the request ({status}): {body}")]
    BadRequest {
        service: String,
        status: u16,
        body: String,
    },

    /// The target failed while handling the request (5xx).
    #[error("{service} service failed with status {status}")]
    Internal { service: String, status: u16 },

    /// The response body was not the expected JSON.
    #[error("invalid response from {service} service: {message}")]
    Decode { service: String, message: String },
}

impl ServiceError {
    /// Connect failures, timeouts and 5xx are worth another attempt; 4xx never is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Unavailable { .. }
                | ServiceError::Timeout { .. }
                | ServiceError::Internal { .. }
        )
    }
}

// ============================================================================
// CIRCUIT BREAKER
// ============================================================================

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    last_failure: Option<Instant>,
}

/// Counts consecutive failures. Once `threshold` is reached every call is refused
/// until `cooldown` has passed since the last failure; then the count starts over.
#[derive(Debug)]
pub struct CircuitBreaker {
    service: String,
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(service: impl Into<String>, threshold: u32, cooldown: Duration) -> Self {
        CircuitBreaker {
            service: service.into(),
            threshold: threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a call may go out at `now`.
    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        if state.failures < self.threshold {
            return true;
        }
        match state.last_failure {
            Some(last) if now.saturating_duration_since(last) < self.cooldown => false,
            _ => {
                tracing::info!(
                    service = %self.service,
                    "Circuit breaker cooldown elapsed, retrying"
                );
                state.failures = 0;
                state.last_failure = None;
                true
            }
        }
    }

    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    pub fn record_failure_at(&self, now: Instant) {
        let mut state = self.lock();
        state.failures += 1;
        state.last_failure = Some(now);
        if state.failures == self.threshold {
            tracing::warn!(
                service = %self.service,
                failures = state.failures,
                "Circuit breaker opened"
            );
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now())
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.failures > 0 {
            tracing::info!(service = %self.service, "Service recovered, circuit breaker reset");
        }
        state.failures = 0;
        state.last_failure = None;
    }

    pub fn is_open_at(&self, now: Instant) -> bool {
        let state = self.lock();
        state.failures >= self.threshold
            && state
                .last_failure
                .map(|last| now.saturating_duration_since(last) < self.cooldown)
                .unwrap_or(false)
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Client bound to one target service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: String,
    base_url: String,
    http: reqwest::Client,
    settings: ClientSettings,
    breaker: Arc<CircuitBreaker>,
}

impl ServiceClient {
    pub fn new(
        service: impl Into<String>,
        base_url: impl Into<String>,
        settings: &ClientSettings,
    ) -> Result<Self, ServiceError> {
        let service = service.into();
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable {
                service: service.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(ServiceClient {
            breaker: Arc::new(CircuitBreaker::new(
                service.clone(),
                settings.breaker_threshold,
                settings.breaker_cooldown,
            )),
            service,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            settings: settings.clone(),
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Delay before attempt `attempt + 1` (attempts count from 1).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.settings
            .retry_wait_min
            .saturating_mul(factor)
            .min(self.settings.retry_wait_max)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        let url = self.url(path);
        self.execute("GET", &url, || self.http.get(&url).query(query))
            .await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        self.execute("POST", &url, || self.http.post(&url).json(body))
            .await
    }

    async fn execute<T, F>(&self, method: &str, url: &str, build: F) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let attempts = self.settings.max_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;

            if !self.breaker.allow() {
                return Err(ServiceError::Unavailable {
                    service: self.service.clone(),
                    message: "circuit breaker open".to_string(),
                });
            }

            match self.attempt(method, url, build()).await {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(err) if err.is_retryable() => {
                    self.breaker.record_failure();
                    if attempt >= attempts {
                        return Err(err);
                    }
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        service = %self.service,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "Retrying service call"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                log_api_call(&self.service, method, url, None, started.elapsed());
                if e.is_timeout() {
                    return Err(ServiceError::Timeout {
                        service: self.service.clone(),
                    });
                }
                return Err(ServiceError::Unavailable {
                    service: self.service.clone(),
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        log_api_call(&self.service, method, url, Some(status.as_u16()), started.elapsed());

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| ServiceError::Decode {
                service: self.service.clone(),
                message: e.to_string(),
            });
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::BadRequest {
                service: self.service.clone(),
                status: status.as_u16(),
                body,
            });
        }
        Err(ServiceError::Internal {
            service: self.service.clone(),
            status: status.as_u16(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Deserialize)]
    struct Pong {
        status: String,
    }

    fn fast_settings(max_retries: u32) -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_millis(200),
            max_retries,
            retry_wait_min: Duration::from_millis(1),
            retry_wait_max: Duration::from_millis(5),
            breaker_threshold: 5,
            breaker_cooldown: Duration::from_secs(60),
        }
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn flaky(State(calls): State<Arc<AtomicU32>>) -> (StatusCode, Json<Value>) {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n < 3 {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "warming up"})))
        } else {
            (StatusCode::OK, Json(json!({"status": "ok"})))
        }
    }

    async fn rejecting(State(calls): State<Arc<AtomicU32>>) -> (StatusCode, Json<Value>) {
        calls.fetch_add(1, Ordering::SeqCst);
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": "bad dates"})))
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let app = Router::new().route("/ping", get(|| async { Json(json!({"status": "ok"})) }));
        let base = spawn(app).await;

        let client = ServiceClient::new("core", format!("{}/", base), &fast_settings(3)).unwrap();
        let pong: Pong = client.get_json("/ping", &[]).await.unwrap();
        assert_eq!(pong.status, "ok");
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route("/flaky", get(flaky))
            .with_state(calls.clone());
        let base = spawn(app).await;

        let client = ServiceClient::new("ghg", base, &fast_settings(3)).unwrap();
        let pong: Pong = client.get_json("flaky", &[]).await.unwrap();

        assert_eq!(pong.status, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!client.breaker().is_open_at(Instant::now()));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route("/flaky", get(flaky))
            .with_state(calls.clone());
        let base = spawn(app).await;

        let client = ServiceClient::new("ghg", base, &fast_settings(2)).unwrap();
        let result: Result<Pong, _> = client.get_json("/flaky", &[]).await;

        assert!(matches!(result, Err(ServiceError::Internal { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route("/inventory/", get(rejecting))
            .with_state(calls.clone());
        let base = spawn(app).await;

        let client = ServiceClient::new("ghg", base, &fast_settings(3)).unwrap();
        let result: Result<Value, _> = client
            .get_json("/inventory/", &[("start_date", "2024-12-31".to_string())])
            .await;

        match result {
            Err(ServiceError::BadRequest { status, body, .. }) => {
                assert_eq!(status, 422);
                assert!(body.contains("bad dates"));
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(1000)).await;
                Json(json!({"status": "late"}))
            }),
        );
        let base = spawn(app).await;

        let mut settings = fast_settings(1);
        settings.timeout = Duration::from_millis(50);
        let client = ServiceClient::new("risk", base, &settings).unwrap();
        let result: Result<Pong, _> = client.get_json("/slow", &[]).await;

        assert!(matches!(result, Err(ServiceError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_bad_body_is_decode_error() {
        let app = Router::new().route("/ping", get(|| async { "not json" }));
        let base = spawn(app).await;

        let client = ServiceClient::new("core", base, &fast_settings(3)).unwrap();
        let result: Result<Pong, _> = client.get_json("/ping", &[]).await;
        assert!(matches!(result, Err(ServiceError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_opens_breaker() {
        // Grab a free port, then close it so nothing listens there
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut settings = fast_settings(1);
        settings.breaker_threshold = 2;
        let client = ServiceClient::new("ai", format!("http://{}", addr), &settings).unwrap();

        for _ in 0..2 {
            let result: Result<Value, _> = client
                .post_json("/analyze/aspect_type", &json!({"text": "smoke"}))
                .await;
            assert!(matches!(result, Err(ServiceError::Unavailable { .. })));
        }
        assert!(client.breaker().is_open_at(Instant::now()));

        let result: Result<Value, _> = client.get_json("/", &[]).await;
        match result {
            Err(ServiceError::Unavailable { message, .. }) => {
                assert_eq!(message, "circuit breaker open")
            }
            other => panic!("expected fast failure, got {:?}", other),
        }
    }

    #[test]
    fn test_breaker_cooldown() {
        let breaker = CircuitBreaker::new("core", 3, Duration::from_secs(60));
        let t0 = Instant::now();

        breaker.record_failure_at(t0);
        breaker.record_failure_at(t0);
        assert!(breaker.allow_at(t0));

        breaker.record_failure_at(t0);
        assert!(breaker.is_open_at(t0));
        assert!(!breaker.allow_at(t0 + Duration::from_secs(59)));

        // After the cooldown the count resets
        assert!(breaker.allow_at(t0 + Duration::from_secs(61)));
        assert!(!breaker.is_open_at(t0 + Duration::from_secs(61)));
    }

    #[test]
    fn test_success_resets_failures() {
        let breaker = CircuitBreaker::new("risk", 2, Duration::from_secs(60));
        let t0 = Instant::now();

        breaker.record_failure_at(t0);
        breaker.record_success();
        breaker.record_failure_at(t0);
        assert!(breaker.allow_at(t0));
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let settings = ClientSettings {
            retry_wait_min: Duration::from_millis(1000),
            retry_wait_max: Duration::from_millis(10_000),
            ..ClientSettings::default()
        };
        let client = ServiceClient::new("core", "http://127.0.0.1:1", &settings).unwrap();

        assert_eq!(client.backoff(1), Duration::from_millis(1000));
        assert_eq!(client.backoff(2), Duration::from_millis(2000));
        assert_eq!(client.backoff(3), Duration::from_millis(4000));
        assert_eq!(client.backoff(5), Duration::from_millis(10_000));
    }
}
