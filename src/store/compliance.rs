// ⚖️ Compliance obligations and their links to aspects

use super::{
    management::{aspect_exists, row_to_aspect_summary},
    Page,
};
use crate::entities::{AspectSummary, ComplianceObligation, NewObligation, ObligationSummary};
use crate::error::{classify_constraint, Error, Result};
use crate::logging::{log_business_event, log_database_operation};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn row_to_obligation_summary(row: &Row) -> rusqlite::Result<ObligationSummary> {
    Ok(ObligationSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        source: row.get(3)?,
        obligation_type: row.get(4)?,
    })
}

fn with_aspects(conn: &Connection, summary: ObligationSummary) -> Result<ComplianceObligation> {
    let aspects = aspects_for_obligation(conn, summary.id)?;
    Ok(ComplianceObligation {
        id: summary.id,
        name: summary.name,
        description: summary.description,
        source: summary.source,
        obligation_type: summary.obligation_type,
        aspects,
    })
}

fn aspects_for_obligation(conn: &Connection, obligation_id: i64) -> Result<Vec<AspectSummary>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.description, a.lifecycle_stage, a.aspect_type, a.is_significant
         FROM environmental_aspects a
         JOIN aspect_obligation_link l ON l.aspect_id = a.id
         WHERE l.obligation_id = ?1
         ORDER BY a.id",
    )?;
    let aspects = stmt
        .query_map([obligation_id], row_to_aspect_summary)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(aspects)
}

/// Obligations linked to an aspect, without their own aspect lists.
pub fn obligations_for_aspect(conn: &Connection, aspect_id: i64) -> Result<Vec<ObligationSummary>> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.name, o.description, o.source, o.obligation_type
         FROM compliance_obligations o
         JOIN aspect_obligation_link l ON l.obligation_id = o.id
         WHERE l.aspect_id = ?1
         ORDER BY o.id",
    )?;
    let obligations = stmt
        .query_map([aspect_id], row_to_obligation_summary)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(obligations)
}

pub fn create_obligation(conn: &Connection, new: NewObligation) -> Result<ComplianceObligation> {
    new.validate()?;

    conn.execute(
        "INSERT INTO compliance_obligations (name, description, source, obligation_type)
         VALUES (?1, ?2, ?3, ?4)",
        params![new.name, new.description, new.source, new.obligation_type],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "compliance_obligations", Some(id));

    Ok(ComplianceObligation {
        id,
        name: new.name,
        description: new.description,
        source: new.source,
        obligation_type: new.obligation_type,
        aspects: Vec::new(),
    })
}

pub fn get_obligation(
    conn: &Connection,
    obligation_id: i64,
) -> Result<Option<ComplianceObligation>> {
    let summary = conn
        .query_row(
            "SELECT id, name, description, source, obligation_type
             FROM compliance_obligations WHERE id = ?1",
            [obligation_id],
            row_to_obligation_summary,
        )
        .optional()?;

    summary.map(|s| with_aspects(conn, s)).transpose()
}

pub fn list_obligations(conn: &Connection, page: Page) -> Result<Vec<ComplianceObligation>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, source, obligation_type
         FROM compliance_obligations ORDER BY id LIMIT ?1 OFFSET ?2",
    )?;
    let summaries = stmt
        .query_map(params![page.limit, page.skip], row_to_obligation_summary)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    summaries.into_iter().map(|s| with_aspects(conn, s)).collect()
}

/// Link an obligation to an aspect and return the obligation with its aspects.
///
/// Both records must exist; linking the same pair twice is a conflict.
pub fn link_obligation_to_aspect(
    conn: &Connection,
    aspect_id: i64,
    obligation_id: i64,
) -> Result<ComplianceObligation> {
    if !aspect_exists(conn, aspect_id)? {
        return Err(Error::not_found("Aspect not found"));
    }
    if get_obligation(conn, obligation_id)?.is_none() {
        return Err(Error::not_found("Obligation not found"));
    }

    conn.execute(
        "INSERT INTO aspect_obligation_link (aspect_id, obligation_id) VALUES (?1, ?2)",
        params![aspect_id, obligation_id],
    )
    .map_err(|e| {
        classify_constraint(
            e,
            || format!("Obligation {} is already linked to aspect {}.", obligation_id, aspect_id),
            || "Aspect or obligation not found".to_string(),
        )
    })?;
    log_database_operation("LINK", "aspect_obligation_link", Some(obligation_id));
    log_business_event(
        "obligation_linked",
        &format!("obligation {} applies to aspect {}", obligation_id, aspect_id),
    );

    get_obligation(conn, obligation_id)?.ok_or_else(|| Error::not_found("Obligation not found"))
}
