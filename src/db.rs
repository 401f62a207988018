use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database file and make sure the schema exists.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    tracing::info!(path = %path.display(), "Database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // SQLite leaves foreign keys off unless asked, per connection
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Core management system: policy, aspects, risks, obligations
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS environmental_policies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            version TEXT NOT NULL,
            content TEXT NOT NULL,
            approval_date TEXT NOT NULL,
            approved_by TEXT NOT NULL,
            includes_climate_commitment INTEGER NOT NULL DEFAULT 0,
            includes_circular_economy_commitment INTEGER NOT NULL DEFAULT 0,
            includes_biodiversity_commitment INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS environmental_aspects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            lifecycle_stage TEXT NOT NULL,
            aspect_type TEXT NOT NULL,
            is_significant INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS risks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            probability INTEGER NOT NULL CHECK (probability BETWEEN 1 AND 5),
            impact INTEGER NOT NULL CHECK (impact BETWEEN 1 AND 5),
            aspect_id INTEGER REFERENCES environmental_aspects(id),
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS compliance_obligations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            source TEXT NOT NULL,
            obligation_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS aspect_obligation_link (
            aspect_id INTEGER NOT NULL REFERENCES environmental_aspects(id),
            obligation_id INTEGER NOT NULL REFERENCES compliance_obligations(id),
            PRIMARY KEY (aspect_id, obligation_id)
        );",
    )?;

    // ==========================================================================
    // Objectives & audits
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS objectives (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            target_value REAL NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS indicators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            current_value REAL NOT NULL,
            unit TEXT NOT NULL,
            objective_id INTEGER NOT NULL REFERENCES objectives(id)
        );

        CREATE TABLE IF NOT EXISTS audits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS audit_findings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            evidence TEXT NOT NULL,
            clause TEXT NOT NULL,
            finding_type TEXT NOT NULL,
            audit_id INTEGER NOT NULL REFERENCES audits(id)
        );",
    )?;

    // ==========================================================================
    // GHG ledger
    // Labels (scope, source_type) are plain TEXT: the calculator tolerates
    // unexpected values rather than failing the whole inventory.
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS emission_factors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            value REAL NOT NULL,
            unit TEXT NOT NULL,
            source TEXT
        );

        CREATE TABLE IF NOT EXISTS emission_sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            source_type TEXT NOT NULL,
            scope TEXT NOT NULL,
            factor_id INTEGER REFERENCES emission_factors(id)
        );

        CREATE TABLE IF NOT EXISTS activity_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            value REAL NOT NULL,
            unit TEXT NOT NULL,
            activity_date TEXT NOT NULL,
            source_id INTEGER REFERENCES emission_sources(id)
        );",
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_risks_aspect ON risks(aspect_id);
         CREATE INDEX IF NOT EXISTS idx_link_obligation ON aspect_obligation_link(obligation_id);
         CREATE INDEX IF NOT EXISTS idx_indicators_objective ON indicators(objective_id);
         CREATE INDEX IF NOT EXISTS idx_findings_audit ON audit_findings(audit_id);
         CREATE INDEX IF NOT EXISTS idx_activity_date ON activity_data(activity_date);
         CREATE INDEX IF NOT EXISTS idx_activity_source ON activity_data(source_id);",
    )?;

    Ok(())
}

/// Count rows in a table (used by the CLI to report progress).
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}
