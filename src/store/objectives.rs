// 🎯 Objectives & indicators

use super::Page;
use crate::entities::{Indicator, NewIndicator, NewObjective, Objective, ObjectiveSummary};
use crate::error::{Error, Result};
use crate::logging::log_database_operation;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn row_to_objective(row: &Row) -> rusqlite::Result<Objective> {
    Ok(Objective {
        id: row.get(0)?,
        description: row.get(1)?,
        target_value: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        indicators: Vec::new(),
    })
}

fn load_indicators(conn: &Connection, objective: &ObjectiveSummary) -> Result<Vec<Indicator>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, current_value, unit FROM indicators WHERE objective_id = ?1 ORDER BY id",
    )?;
    let indicators = stmt
        .query_map([objective.id], |row| {
            Ok(Indicator {
                id: row.get(0)?,
                name: row.get(1)?,
                current_value: row.get(2)?,
                unit: row.get(3)?,
                objective: objective.clone(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(indicators)
}

pub fn create_objective(conn: &Connection, new: NewObjective) -> Result<Objective> {
    new.validate()?;

    conn.execute(
        "INSERT INTO objectives (description, target_value, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![new.description, new.target_value, new.start_date, new.end_date],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "objectives", Some(id));

    Ok(Objective {
        id,
        description: new.description,
        target_value: new.target_value,
        start_date: new.start_date,
        end_date: new.end_date,
        indicators: Vec::new(),
    })
}

pub fn get_objective(conn: &Connection, objective_id: i64) -> Result<Option<Objective>> {
    let objective = conn
        .query_row(
            "SELECT id, description, target_value, start_date, end_date
             FROM objectives WHERE id = ?1",
            [objective_id],
            row_to_objective,
        )
        .optional()?;

    match objective {
        Some(mut objective) => {
            objective.indicators = load_indicators(conn, &objective.summary())?;
            Ok(Some(objective))
        }
        None => Ok(None),
    }
}

pub fn list_objectives(conn: &Connection, page: Page) -> Result<Vec<Objective>> {
    let mut stmt = conn.prepare(
        "SELECT id, description, target_value, start_date, end_date
         FROM objectives ORDER BY id LIMIT ?1 OFFSET ?2",
    )?;
    let mut objectives = stmt
        .query_map(params![page.limit, page.skip], row_to_objective)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for objective in objectives.iter_mut() {
        objective.indicators = load_indicators(conn, &objective.summary())?;
    }
    Ok(objectives)
}

/// Record a new indicator value for an objective.
pub fn create_indicator(
    conn: &Connection,
    objective_id: i64,
    new: NewIndicator,
) -> Result<Indicator> {
    new.validate()?;
    let objective = get_objective(conn, objective_id)?
        .ok_or_else(|| Error::not_found("Objective not found"))?;

    conn.execute(
        "INSERT INTO indicators (name, current_value, unit, objective_id) VALUES (?1, ?2, ?3, ?4)",
        params![new.name, new.current_value, new.unit, objective_id],
    )?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "indicators", Some(id));

    Ok(Indicator {
        id,
        name: new.name,
        current_value: new.current_value,
        unit: new.unit,
        objective: objective.summary(),
    })
}
