// 🏛️ Policy & aspects

use super::{compliance, risk, Page};
use crate::entities::{
    AspectSummary, EnvironmentalAspect, EnvironmentalPolicy, NewAspect, NewPolicy,
};
use crate::error::Result;
use crate::logging::{log_business_event, log_database_operation};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

// ============================================================================
// POLICY
// ============================================================================

const POLICY_COLUMNS: &str = "id, version, content, approval_date, approved_by,
    includes_climate_commitment, includes_circular_economy_commitment,
    includes_biodiversity_commitment";

fn row_to_policy(row: &Row) -> rusqlite::Result<EnvironmentalPolicy> {
    Ok(EnvironmentalPolicy {
        id: row.get(0)?,
        version: row.get(1)?,
        content: row.get(2)?,
        approval_date: row.get(3)?,
        approved_by: row.get(4)?,
        includes_climate_commitment: row.get(5)?,
        includes_circular_economy_commitment: row.get(6)?,
        includes_biodiversity_commitment: row.get(7)?,
    })
}

/// The organisation has at most one policy; this returns it if defined.
pub fn get_policy(conn: &Connection) -> Result<Option<EnvironmentalPolicy>> {
    let policy = conn
        .query_row(
            &format!(
                "SELECT {} FROM environmental_policies ORDER BY id LIMIT 1",
                POLICY_COLUMNS
            ),
            [],
            row_to_policy,
        )
        .optional()?;
    Ok(policy)
}

/// Create the policy, or replace every field of the existing one.
pub fn upsert_policy(conn: &Connection, new: NewPolicy) -> Result<EnvironmentalPolicy> {
    new.validate()?;

    let id = match get_policy(conn)? {
        Some(existing) => {
            conn.execute(
                "UPDATE environmental_policies
                 SET version = ?1, content = ?2, approval_date = ?3, approved_by = ?4,
                     includes_climate_commitment = ?5,
                     includes_circular_economy_commitment = ?6,
                     includes_biodiversity_commitment = ?7
                 WHERE id = ?8",
                params![
                    new.version,
                    new.content,
                    new.approval_date,
                    new.approved_by,
                    new.includes_climate_commitment,
                    new.includes_circular_economy_commitment,
                    new.includes_biodiversity_commitment,
                    existing.id,
                ],
            )?;
            log_database_operation("UPDATE", "environmental_policies", Some(existing.id));
            existing.id
        }
        None => {
            conn.execute(
                "INSERT INTO environmental_policies (
                    version, content, approval_date, approved_by,
                    includes_climate_commitment, includes_circular_economy_commitment,
                    includes_biodiversity_commitment
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.version,
                    new.content,
                    new.approval_date,
                    new.approved_by,
                    new.includes_climate_commitment,
                    new.includes_circular_economy_commitment,
                    new.includes_biodiversity_commitment,
                ],
            )?;
            let id = conn.last_insert_rowid();
            log_database_operation("CREATE", "environmental_policies", Some(id));
            id
        }
    };

    log_business_event("policy_published", &format!("policy version {}", new.version));
    Ok(EnvironmentalPolicy::from_new(id, new))
}

// ============================================================================
// ASPECTS
// ============================================================================

const ASPECT_COLUMNS: &str =
    "id, name, description, lifecycle_stage, aspect_type, is_significant, created_at, updated_at";

pub(crate) fn row_to_aspect_summary(row: &Row) -> rusqlite::Result<AspectSummary> {
    Ok(AspectSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        lifecycle_stage: row.get(3)?,
        aspect_type: row.get(4)?,
        is_significant: row.get(5)?,
    })
}

fn row_to_aspect(row: &Row) -> rusqlite::Result<EnvironmentalAspect> {
    Ok(EnvironmentalAspect {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        lifecycle_stage: row.get(3)?,
        aspect_type: row.get(4)?,
        is_significant: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        obligations: Vec::new(),
        risks: Vec::new(),
    })
}

fn with_relations(
    conn: &Connection,
    mut aspect: EnvironmentalAspect,
) -> Result<EnvironmentalAspect> {
    aspect.obligations = compliance::obligations_for_aspect(conn, aspect.id)?;
    aspect.risks = risk::list_risks_for_aspect(conn, aspect.id, Page::new(0, u32::MAX))?
        .iter()
        .map(|r| r.summary())
        .collect();
    Ok(aspect)
}

pub fn aspect_exists(conn: &Connection, aspect_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM environmental_aspects WHERE id = ?1",
            [aspect_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Register an aspect. `updated_at` starts equal to `created_at`.
pub fn create_aspect(conn: &Connection, new: NewAspect) -> Result<EnvironmentalAspect> {
    new.validate()?;
    let now = Utc::now();

    conn.execute(
        "INSERT INTO environmental_aspects (
            name, description, lifecycle_stage, aspect_type, is_significant, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            new.name,
            new.description,
            new.lifecycle_stage,
            new.aspect_type,
            new.is_significant,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "environmental_aspects", Some(id));
    log_business_event(
        "aspect_created",
        &format!("aspect '{}' registered as {}", new.name, new.aspect_type),
    );

    Ok(EnvironmentalAspect {
        id,
        name: new.name,
        description: new.description,
        lifecycle_stage: new.lifecycle_stage,
        aspect_type: new.aspect_type,
        is_significant: new.is_significant,
        created_at: now,
        updated_at: Some(now),
        obligations: Vec::new(),
        risks: Vec::new(),
    })
}

pub fn get_aspect(conn: &Connection, aspect_id: i64) -> Result<Option<EnvironmentalAspect>> {
    let aspect = conn
        .query_row(
            &format!("SELECT {} FROM environmental_aspects WHERE id = ?1", ASPECT_COLUMNS),
            [aspect_id],
            row_to_aspect,
        )
        .optional()?;

    match aspect {
        Some(aspect) => Ok(Some(with_relations(conn, aspect)?)),
        None => Ok(None),
    }
}

pub fn list_aspects(conn: &Connection, page: Page) -> Result<Vec<EnvironmentalAspect>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM environmental_aspects ORDER BY id LIMIT ?1 OFFSET ?2",
        ASPECT_COLUMNS
    ))?;

    let aspects = stmt
        .query_map(params![page.limit, page.skip], row_to_aspect)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    aspects
        .into_iter()
        .map(|aspect| with_relations(conn, aspect))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::{AspectType, LifecycleStage};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn sample_policy(version: &str) -> NewPolicy {
        NewPolicy {
            version: version.to_string(),
            content: "We commit to pollution prevention.".to_string(),
            approval_date: "2024-02-01T09:00:00Z".parse().unwrap(),
            approved_by: "Board of Directors".to_string(),
            includes_climate_commitment: true,
            includes_circular_economy_commitment: false,
            includes_biodiversity_commitment: true,
        }
    }

    fn sample_aspect(name: &str, significant: bool) -> NewAspect {
        NewAspect {
            name: name.to_string(),
            description: "Exhaust gases from the delivery fleet".to_string(),
            lifecycle_stage: LifecycleStage::TransportationDistribution,
            aspect_type: AspectType::Emission,
            is_significant: significant,
        }
    }

    #[test]
    fn test_policy_upsert_keeps_single_record() {
        let conn = test_conn();
        assert!(get_policy(&conn).unwrap().is_none());

        let first = upsert_policy(&conn, sample_policy("1.0")).unwrap();
        let second = upsert_policy(&conn, sample_policy("2.0")).unwrap();

        assert_eq!(first.id, second.id);
        let stored = get_policy(&conn).unwrap().unwrap();
        assert_eq!(stored.version, "2.0");
        assert_eq!(stored.commitment_count(), 2);
        assert_eq!(crate::db::count_rows(&conn, "environmental_policies").unwrap(), 1);
    }

    #[test]
    fn test_policy_validation() {
        let conn = test_conn();
        let mut policy = sample_policy("1.0");
        policy.approved_by = "  ".to_string();
        assert!(upsert_policy(&conn, policy).is_err());
    }

    #[test]
    fn test_create_and_get_aspect() {
        let conn = test_conn();
        let created = create_aspect(&conn, sample_aspect("Fleet exhaust", true)).unwrap();

        assert_eq!(created.updated_at, Some(created.created_at));

        let loaded = get_aspect(&conn, created.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Fleet exhaust");
        assert_eq!(loaded.aspect_type, AspectType::Emission);
        assert!(loaded.is_significant);
        assert!(loaded.risks.is_empty());
        assert!(loaded.obligations.is_empty());

        assert!(get_aspect(&conn, 999).unwrap().is_none());
        assert!(aspect_exists(&conn, created.id).unwrap());
        assert!(!aspect_exists(&conn, 999).unwrap());
    }

    #[test]
    fn test_list_aspects_paginates() {
        let conn = test_conn();
        for i in 0..5 {
            create_aspect(&conn, sample_aspect(&format!("aspect-{}", i), i % 2 == 0)).unwrap();
        }

        let all = list_aspects(&conn, Page::default()).unwrap();
        assert_eq!(all.len(), 5);

        let page = list_aspects(&conn, Page::new(2, 2)).unwrap();
        let names: Vec<&str> = page.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["aspect-2", "aspect-3"]);
    }
}
