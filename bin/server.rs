// Environmental Management System - Web Server
// Mounts the services selected by EMS_SERVICES under /api/v1

use anyhow::{Context, Result};
use ems_records::api::{build_router, AppState};
use ems_records::{logging, open_database, AspectClassifier, Config, KeywordClassifier};
use std::future::Future;
use std::sync::Arc;

fn load_classifier(config: &Config) -> Result<Arc<dyn AspectClassifier>> {
    let classifier = match &config.classifier_rules {
        Some(path) => KeywordClassifier::from_file(path)
            .with_context(|| format!("Failed to load classifier rules from {}", path.display()))?,
        None => KeywordClassifier::default(),
    };
    Ok(Arc::new(classifier))
}

/// Resolves once `signal` fires. If the signal handler failed to install, never resolves.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => {
            tracing::error!(
                error = %err,
                "Failed to install ctrl-c handler, graceful shutdown disabled"
            );
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;
    logging::init(&config);

    let conn = open_database(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    let classifier = load_classifier(&config)?;

    let bind_addr = config.bind_addr;
    let services: Vec<&str> = config.services.iter().map(|s| s.as_str()).collect();
    tracing::info!(services = %services.join(","), "Starting services");

    let state = AppState::new(conn, config, classifier).context("Failed to build service clients")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(tokio::signal::ctrl_c()))
        .await
        .context("Server error")?;

    Ok(())
}
