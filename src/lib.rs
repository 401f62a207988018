// Environmental Management System - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod db;
pub mod entities;
pub mod inventory;
pub mod store;
pub mod classifier;
pub mod import;

#[cfg(feature = "server")]
pub mod http_client;
#[cfg(feature = "server")]
pub mod reporting;
#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{Config, ConfigError, ServiceKind};
pub use error::{Error, Result};
pub use db::{count_rows, open_database, setup_database};
pub use inventory::{
    calculate_emissions, summarize, ActivityEntry, GhgInventory, InventorySummary,
    ResolvedSource, ScopeBreakdown,
};
pub use classifier::{AspectClassifier, Classification, KeywordClassifier, KeywordRule};
pub use import::load_activity_csv;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
