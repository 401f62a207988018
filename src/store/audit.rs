// 🔍 Internal audits & findings

use super::Page;
use crate::entities::{Audit, AuditFinding, AuditSummary, FindingType, NewAudit, NewFinding};
use crate::error::{Error, Result};
use crate::logging::{log_business_event, log_database_operation};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn row_to_audit(row: &Row) -> rusqlite::Result<Audit> {
    Ok(Audit {
        id: row.get(0)?,
        scope: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        findings: Vec::new(),
    })
}

fn load_findings(conn: &Connection, audit: &AuditSummary) -> Result<Vec<AuditFinding>> {
    let mut stmt = conn.prepare(
        "SELECT id, description, evidence, clause, finding_type
         FROM audit_findings WHERE audit_id = ?1 ORDER BY id",
    )?;
    let findings = stmt
        .query_map([audit.id], |row| {
            Ok(AuditFinding {
                id: row.get(0)?,
                description: row.get(1)?,
                evidence: row.get(2)?,
                clause: row.get(3)?,
                finding_type: row.get(4)?,
                audit: audit.clone(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(findings)
}

pub fn create_audit(conn: &Connection, new: NewAudit) -> Result<Audit> {
    new.validate()?;

    conn.execute(
        "INSERT INTO audits (scope, start_date, end_date) VALUES (?1, ?2, ?3)",
        params![new.scope, new.start_date, new.end_date],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "audits", Some(id));

    Ok(Audit {
        id,
        scope: new.scope,
        start_date: new.start_date,
        end_date: new.end_date,
        findings: Vec::new(),
    })
}

pub fn get_audit(conn: &Connection, audit_id: i64) -> Result<Option<Audit>> {
    let audit = conn
        .query_row(
            "SELECT id, scope, start_date, end_date FROM audits WHERE id = ?1",
            [audit_id],
            row_to_audit,
        )
        .optional()?;

    match audit {
        Some(mut audit) => {
            audit.findings = load_findings(conn, &audit.summary())?;
            Ok(Some(audit))
        }
        None => Ok(None),
    }
}

pub fn list_audits(conn: &Connection, page: Page) -> Result<Vec<Audit>> {
    let mut stmt = conn.prepare(
        "SELECT id, scope, start_date, end_date FROM audits ORDER BY id LIMIT ?1 OFFSET ?2",
    )?;
    let mut audits = stmt
        .query_map(params![page.limit, page.skip], row_to_audit)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for audit in audits.iter_mut() {
        audit.findings = load_findings(conn, &audit.summary())?;
    }
    Ok(audits)
}

pub fn create_finding(conn: &Connection, audit_id: i64, new: NewFinding) -> Result<AuditFinding> {
    new.validate()?;
    let audit = get_audit(conn, audit_id)?.ok_or_else(|| Error::not_found("Audit not found"))?;

    conn.execute(
        "INSERT INTO audit_findings (description, evidence, clause, finding_type, audit_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.description, new.evidence, new.clause, new.finding_type, audit_id],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "audit_findings", Some(id));

    if new.finding_type == FindingType::NonconformityMajor {
        log_business_event(
            "major_nonconformity",
            &format!("audit {} raised a major nonconformity against {}", audit_id, new.clause),
        );
    }

    Ok(AuditFinding {
        id,
        description: new.description,
        evidence: new.evidence,
        clause: new.clause,
        finding_type: new.finding_type,
        audit: audit.summary(),
    })
}
