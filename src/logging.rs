// 📜 Structured logging
// One subscriber per process plus small helpers so API calls, database writes and
// business events all carry the same field names.

use crate::config::{Config, LogFormat};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `EMS_LOG_LEVEL` when both are set. Calling this twice is a
/// no-op (the second `try_init` fails quietly), which keeps tests simple.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ems_records={0},ems_server={0},tower_http=info",
            config.log_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let _ = match config.log_format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

/// Record a call to another service.
pub fn log_api_call(
    service: &str,
    method: &str,
    url: &str,
    status: Option<u16>,
    duration: Duration,
) {
    let duration_ms = duration.as_secs_f64() * 1000.0;
    match status {
        Some(code) if code >= 400 => tracing::error!(
            service,
            api_method = method,
            api_url = url,
            status_code = code,
            duration_ms,
            "API call failed: {} {}",
            method,
            url
        ),
        Some(code) => tracing::info!(
            service,
            api_method = method,
            api_url = url,
            status_code = code,
            duration_ms,
            "API call: {} {}",
            method,
            url
        ),
        None => tracing::warn!(
            service,
            api_method = method,
            api_url = url,
            duration_ms,
            "API call got no response: {} {}",
            method,
            url
        ),
    }
}

/// Record a write against a table.
pub fn log_database_operation(operation: &str, table: &str, record_id: Option<i64>) {
    match record_id {
        Some(id) => tracing::info!(
            db_operation = operation,
            db_table = table,
            record_id = id,
            "Database {}: {}",
            operation,
            table
        ),
        None => tracing::info!(
            db_operation = operation,
            db_table = table,
            "Database {}: {}",
            operation,
            table
        ),
    }
}

/// Record a domain event (aspect created, finding raised...).
pub fn log_business_event(event_type: &str, description: &str) {
    tracing::info!(event_type, "Business event: {}", description);
}
