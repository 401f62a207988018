// ⚠️ Risk register

use super::{management::aspect_exists, Page};
use crate::entities::{risk_level, NewRisk, Risk};
use crate::error::{Error, Result};
use crate::logging::log_database_operation;
use chrono::Utc;
use rusqlite::{params, Connection, Row};

const RISK_COLUMNS: &str =
    "id, description, category, probability, impact, aspect_id, created_at, updated_at";

fn row_to_risk(row: &Row) -> rusqlite::Result<Risk> {
    let probability: u8 = row.get(3)?;
    let impact: u8 = row.get(4)?;
    Ok(Risk {
        id: row.get(0)?,
        description: row.get(1)?,
        category: row.get(2)?,
        probability,
        impact,
        aspect_id: row.get(5)?,
        risk_level: risk_level(probability, impact),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Register a risk against an existing aspect.
pub fn create_risk(conn: &Connection, aspect_id: i64, new: NewRisk) -> Result<Risk> {
    new.validate()?;
    if !aspect_exists(conn, aspect_id)? {
        return Err(Error::not_found("Aspect not found"));
    }

    let now = Utc::now();
    conn.execute(
        "INSERT INTO risks
            (description, category, probability, impact, aspect_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            new.description,
            new.category,
            new.probability,
            new.impact,
            aspect_id,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "risks", Some(id));

    Ok(Risk {
        id,
        risk_level: risk_level(new.probability, new.impact),
        description: new.description,
        category: new.category,
        probability: new.probability,
        impact: new.impact,
        aspect_id: Some(aspect_id),
        created_at: now,
        updated_at: Some(now),
    })
}

pub fn list_risks(conn: &Connection, page: Page) -> Result<Vec<Risk>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM risks ORDER BY id LIMIT ?1 OFFSET ?2",
        RISK_COLUMNS
    ))?;
    let risks = stmt
        .query_map(params![page.limit, page.skip], row_to_risk)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(risks)
}

pub fn list_risks_for_aspect(conn: &Connection, aspect_id: i64, page: Page) -> Result<Vec<Risk>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM risks WHERE aspect_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        RISK_COLUMNS
    ))?;
    let risks = stmt
        .query_map(params![aspect_id, page.limit, page.skip], row_to_risk)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(risks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::{AspectType, LifecycleStage, NewAspect, RiskCategory};
    use crate::store::management::{create_aspect, get_aspect};

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let aspect = create_aspect(
            &conn,
            NewAspect {
                name: "Fuel storage".to_string(),
                description: "Above-ground diesel tank".to_string(),
                lifecycle_stage: LifecycleStage::Manufacturing,
                aspect_type: AspectType::Consumption,
                is_significant: true,
            },
        )
        .unwrap();
        (conn, aspect.id)
    }

    fn new_risk(probability: u8, impact: u8) -> NewRisk {
        NewRisk {
            description: "Tank leak reaching soil".to_string(),
            category: RiskCategory::Operational,
            probability,
            impact,
        }
    }

    #[test]
    fn test_create_risk_derives_level() {
        let (conn, aspect_id) = setup();
        let risk = create_risk(&conn, aspect_id, new_risk(3, 4)).unwrap();

        assert_eq!(risk.risk_level, 12);
        assert_eq!(risk.aspect_id, Some(aspect_id));

        let listed = list_risks(&conn, Page::default()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].risk_level, 12);
        assert_eq!(listed[0].category, RiskCategory::Operational);
    }

    #[test]
    fn test_create_risk_for_missing_aspect() {
        let (conn, _) = setup();
        let result = create_risk(&conn, 404, new_risk(2, 2));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_out_of_range_scores_are_rejected() {
        let (conn, aspect_id) = setup();
        assert!(matches!(
            create_risk(&conn, aspect_id, new_risk(6, 1)),
            Err(Error::Validation(_))
        ));
        assert_eq!(crate::db::count_rows(&conn, "risks").unwrap(), 0);
    }

    #[test]
    fn test_aspect_nests_its_risks() {
        let (conn, aspect_id) = setup();
        create_risk(&conn, aspect_id, new_risk(1, 2)).unwrap();
        create_risk(&conn, aspect_id, new_risk(5, 5)).unwrap();

        let aspect = get_aspect(&conn, aspect_id).unwrap().unwrap();
        let levels: Vec<u32> = aspect.risks.iter().map(|r| r.risk_level).collect();
        assert_eq!(levels, vec![2, 25]);

        let for_aspect = list_risks_for_aspect(&conn, aspect_id, Page::default()).unwrap();
        assert_eq!(for_aspect.len(), 2);
        assert!(list_risks_for_aspect(&conn, aspect_id + 1, Page::default())
            .unwrap()
            .is_empty());
    }
}
