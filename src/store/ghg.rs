// 🏭 GHG ledger: emission factors, sources and activity data
//
// Factors and sources are registries; activity rows are append-only. The inventory
// read path LEFT JOINs activity → source → factor so broken links surface as `None`
// instead of dropping the row before the calculator sees it.

use super::Page;
use crate::config::DefaultFactors;
use crate::entities::{
    ActivityData, EmissionFactor, EmissionSource, NewActivityData, NewEmissionFactor,
    NewEmissionSource,
};
use crate::error::{classify_constraint, Error, Result};
use crate::inventory::{ActivityEntry, ResolvedSource};
use crate::logging::log_database_operation;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

// ============================================================================
// EMISSION FACTORS
// ============================================================================

fn row_to_factor(row: &Row) -> rusqlite::Result<EmissionFactor> {
    Ok(EmissionFactor {
        id: row.get(0)?,
        name: row.get(1)?,
        value: row.get(2)?,
        unit: row.get(3)?,
        source: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// Register an emission factor. Names are unique.
pub fn create_factor(conn: &Connection, new: NewEmissionFactor) -> Result<EmissionFactor> {
    new.validate()?;

    conn.execute(
        "INSERT INTO emission_factors (name, value, unit, source) VALUES (?1, ?2, ?3, ?4)",
        params![new.name, new.value, new.unit, new.source],
    )
    .map_err(|e| {
        classify_constraint(
            e,
            || format!("Emission factor with name '{}' already exists.", new.name),
            || "Invalid emission factor reference".to_string(),
        )
    })?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "emission_factors", Some(id));

    Ok(EmissionFactor {
        id,
        name: new.name,
        value: new.value,
        unit: new.unit,
        source: new.source,
    })
}

pub fn get_factor(conn: &Connection, factor_id: i64) -> Result<Option<EmissionFactor>> {
    let factor = conn
        .query_row(
            "SELECT id, name, value, unit, source FROM emission_factors WHERE id = ?1",
            [factor_id],
            row_to_factor,
        )
        .optional()?;
    Ok(factor)
}

pub fn find_factor_by_name(conn: &Connection, name: &str) -> Result<Option<EmissionFactor>> {
    let factor = conn
        .query_row(
            "SELECT id, name, value, unit, source FROM emission_factors WHERE name = ?1",
            [name],
            row_to_factor,
        )
        .optional()?;
    Ok(factor)
}

pub fn list_factors(conn: &Connection, page: Page) -> Result<Vec<EmissionFactor>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, value, unit, source FROM emission_factors ORDER BY id LIMIT ?1 OFFSET ?2",
    )?;
    let factors = stmt
        .query_map(params![page.limit, page.skip], row_to_factor)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(factors)
}

/// Insert the configured default factors, skipping names already present.
/// Returns how many were inserted.
pub fn seed_default_factors(conn: &Connection, defaults: &DefaultFactors) -> Result<usize> {
    let seeds = [
        ("Grid electricity", defaults.electricity_kwh, "kWh"),
        ("Gasoline", defaults.gasoline_liter, "liter"),
        ("Diesel", defaults.diesel_liter, "liter"),
    ];

    let mut inserted = 0;
    for (name, value, unit) in seeds {
        if find_factor_by_name(conn, name)?.is_some() {
            tracing::debug!(factor = name, "Default factor already present");
            continue;
        }
        create_factor(
            conn,
            NewEmissionFactor {
                name: name.to_string(),
                value,
                unit: unit.to_string(),
                source: "IPCC 2006".to_string(),
            },
        )?;
        inserted += 1;
    }
    Ok(inserted)
}

// ============================================================================
// EMISSION SOURCES
// ============================================================================

fn row_to_source(row: &Row) -> rusqlite::Result<EmissionSource> {
    let factor_id: Option<i64> = row.get(4)?;
    let factor = match factor_id {
        Some(id) => Some(EmissionFactor {
            id,
            name: row.get(5)?,
            value: row.get(6)?,
            unit: row.get(7)?,
            source: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        }),
        None => None,
    };
    Ok(EmissionSource {
        id: row.get(0)?,
        name: row.get(1)?,
        source_type: row.get(2)?,
        scope: row.get(3)?,
        factor,
    })
}

const SOURCE_SELECT: &str = "SELECT s.id, s.name, s.source_type, s.scope,
        f.id, f.name, f.value, f.unit, f.source
    FROM emission_sources s
    LEFT JOIN emission_factors f ON f.id = s.factor_id";

/// Register an emission source. The factor must exist.
pub fn create_source(conn: &Connection, new: NewEmissionSource) -> Result<EmissionSource> {
    new.validate()?;

    conn.execute(
        "INSERT INTO emission_sources (name, source_type, scope, factor_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![new.name, new.source_type, new.scope, new.factor_id],
    )
    .map_err(|e| {
        classify_constraint(
            e,
            || format!("Emission source '{}' already exists.", new.name),
            || format!("Emission factor with id {} does not exist.", new.factor_id),
        )
    })?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "emission_sources", Some(id));

    get_source(conn, id)?.ok_or_else(|| Error::not_found("Emission source not found"))
}

pub fn get_source(conn: &Connection, source_id: i64) -> Result<Option<EmissionSource>> {
    let source = conn
        .query_row(
            &format!("{} WHERE s.id = ?1", SOURCE_SELECT),
            [source_id],
            row_to_source,
        )
        .optional()?;
    Ok(source)
}

pub fn list_sources(conn: &Connection, page: Page) -> Result<Vec<EmissionSource>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY s.id LIMIT ?1 OFFSET ?2",
        SOURCE_SELECT
    ))?;
    let sources = stmt
        .query_map(params![page.limit, page.skip], row_to_source)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sources)
}

// ============================================================================
// ACTIVITY DATA
// ============================================================================

/// Record one measurement. The source must exist.
pub fn create_activity(conn: &Connection, new: NewActivityData) -> Result<ActivityData> {
    new.validate()?;

    conn.execute(
        "INSERT INTO activity_data (value, unit, activity_date, source_id) VALUES (?1, ?2, ?3, ?4)",
        params![new.value, new.unit, new.activity_date, new.source_id],
    )
    .map_err(|e| {
        classify_constraint(
            e,
            || "Duplicate activity record".to_string(),
            || format!("Emission source with id {} does not exist.", new.source_id),
        )
    })?;
    let id = conn.last_insert_rowid();
    log_database_operation("CREATE", "activity_data", Some(id));

    Ok(ActivityData {
        id,
        value: new.value,
        unit: new.unit,
        activity_date: new.activity_date,
        source_id: Some(new.source_id),
    })
}

/// Insert many activity rows in one transaction; either all land or none do.
pub fn import_activities(conn: &mut Connection, rows: Vec<NewActivityData>) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut count = 0;
    for row in rows {
        create_activity(&tx, row)?;
        count += 1;
    }
    tx.commit()?;
    Ok(count)
}

/// Activity rows dated within `[start, end]` (both inclusive), joined to their
/// source and factor, ordered by date then id.
pub fn list_activity_for_period(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ActivityEntry>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.value, a.unit, a.activity_date, a.source_id,
                s.id, s.name, s.source_type, s.scope,
                f.id, f.name, f.value, f.unit, f.source
         FROM activity_data a
         LEFT JOIN emission_sources s ON s.id = a.source_id
         LEFT JOIN emission_factors f ON f.id = s.factor_id
         WHERE a.activity_date BETWEEN ?1 AND ?2
         ORDER BY a.activity_date, a.id",
    )?;

    let entries = stmt
        .query_map(params![start, end], |row| {
            let activity = ActivityData {
                id: row.get(0)?,
                value: row.get(1)?,
                unit: row.get(2)?,
                activity_date: row.get(3)?,
                source_id: row.get(4)?,
            };

            let source_id: Option<i64> = row.get(5)?;
            let source = match source_id {
                Some(id) => {
                    let factor_id: Option<i64> = row.get(9)?;
                    let factor = match factor_id {
                        Some(fid) => Some(EmissionFactor {
                            id: fid,
                            name: row.get(10)?,
                            value: row.get(11)?,
                            unit: row.get(12)?,
                            source: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
                        }),
                        None => None,
                    };
                    Some(ResolvedSource {
                        id,
                        name: row.get(6)?,
                        source_type: row.get(7)?,
                        scope: row.get(8)?,
                        factor,
                    })
                }
                None => None,
            };

            Ok(ActivityEntry { activity, source })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::{EmissionSourceType, GhgScope};
    use crate::inventory::{calculate_emissions, summarize};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn factor(conn: &Connection, name: &str, value: f64) -> EmissionFactor {
        create_factor(
            conn,
            NewEmissionFactor {
                name: name.to_string(),
                value,
                unit: "liter".to_string(),
                source: "IPCC 2006".to_string(),
            },
        )
        .unwrap()
    }

    fn source(conn: &Connection, factor_id: i64, scope: GhgScope) -> EmissionSource {
        create_source(
            conn,
            NewEmissionSource {
                name: "Company Vehicle Fleet".to_string(),
                source_type: EmissionSourceType::MobileCombustion,
                scope,
                factor_id,
            },
        )
        .unwrap()
    }

    fn activity(conn: &Connection, source_id: i64, value: f64, day: NaiveDate) -> ActivityData {
        create_activity(
            conn,
            NewActivityData {
                value,
                unit: "liter".to_string(),
                activity_date: day,
                source_id,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_factor_name_is_conflict() {
        let conn = test_conn();
        factor(&conn, "Diesel", 2.68);

        let again = create_factor(
            &conn,
            NewEmissionFactor {
                name: "Diesel".to_string(),
                value: 2.7,
                unit: "liter".to_string(),
                source: "DEFRA".to_string(),
            },
        );
        match again {
            Err(Error::Conflict(msg)) => {
                assert_eq!(msg, "Emission factor with name 'Diesel' already exists.")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(list_factors(&conn, Page::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_source_requires_existing_factor() {
        let conn = test_conn();
        let result = create_source(
            &conn,
            NewEmissionSource {
                name: "Boiler".to_string(),
                source_type: EmissionSourceType::StationaryCombustion,
                scope: GhgScope::Scope1,
                factor_id: 42,
            },
        );
        assert!(matches!(result, Err(Error::InvalidReference(_))));
    }

    #[test]
    fn test_source_nests_factor() {
        let conn = test_conn();
        let diesel = factor(&conn, "Diesel", 2.68);
        let created = source(&conn, diesel.id, GhgScope::Scope1);

        assert_eq!(created.scope, "Scope 1");
        assert_eq!(created.source_type, "Mobile Combustion");
        assert_eq!(created.factor.as_ref().map(|f| f.id), Some(diesel.id));
        let listed = list_sources(&conn, Page::default()).unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[test]
    fn test_activity_requires_existing_source() {
        let conn = test_conn();
        let result = create_activity(
            &conn,
            NewActivityData {
                value: 10.0,
                unit: "liter".to_string(),
                activity_date: date(2024, 1, 1),
                source_id: 9,
            },
        );
        assert!(matches!(result, Err(Error::InvalidReference(_))));
    }

    #[test]
    fn test_period_bounds_are_inclusive() {
        let conn = test_conn();
        let diesel = factor(&conn, "Diesel", 2.0);
        let fleet = source(&conn, diesel.id, GhgScope::Scope1);

        activity(&conn, fleet.id, 1.0, date(2023, 12, 31));
        activity(&conn, fleet.id, 10.0, date(2024, 1, 1));
        activity(&conn, fleet.id, 20.0, date(2024, 1, 31));
        activity(&conn, fleet.id, 100.0, date(2024, 2, 1));

        let entries = list_activity_for_period(&conn, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert_eq!(entries.len(), 2);

        let inventory = calculate_emissions(&entries);
        assert_eq!(inventory.total_co2e, 60.0);
        assert_eq!(inventory.emissions_by_scope.scope_1, 60.0);
    }

    #[test]
    fn test_broken_links_are_excluded_not_dropped() {
        let conn = test_conn();
        let grid = factor(&conn, "Grid electricity", 0.5);
        let office = source(&conn, grid.id, GhgScope::Scope2);
        activity(&conn, office.id, 100.0, date(2024, 5, 1));

        // A legacy row whose source has no factor
        conn.execute(
            "INSERT INTO emission_sources (name, source_type, scope, factor_id)
             VALUES ('Legacy meter', 'Purchased Electricity', 'Scope 2', NULL)",
            [],
        )
        .unwrap();
        let legacy = conn.last_insert_rowid();
        activity(&conn, legacy, 1000.0, date(2024, 5, 2));

        let entries = list_activity_for_period(&conn, date(2024, 5, 1), date(2024, 5, 31)).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].source.as_ref().unwrap().factor.is_none());

        let summary = summarize(&entries);
        assert_eq!(summary.inventory.total_co2e, 50.0);
        assert_eq!(summary.inventory.emissions_by_scope.scope_2, 50.0);
        assert_eq!(summary.excluded, 1);
    }

    #[test]
    fn test_unknown_scope_label_reaches_calculator() {
        let conn = test_conn();
        let diesel = factor(&conn, "Diesel", 1.0);
        conn.execute(
            "INSERT INTO emission_sources (name, source_type, scope, factor_id)
             VALUES ('Imported site', 'Mobile Combustion', 'Alcance 1', ?1)",
            [diesel.id],
        )
        .unwrap();
        let imported = conn.last_insert_rowid();
        activity(&conn, imported, 7.0, date(2024, 6, 1));

        let entries = list_activity_for_period(&conn, date(2024, 6, 1), date(2024, 6, 1)).unwrap();
        let summary = summarize(&entries);
        assert_eq!(summary.inventory.total_co2e, 7.0);
        assert_eq!(summary.inventory.emissions_by_scope.sum(), 0.0);
        assert_eq!(summary.unbucketed, 1);
    }

    #[test]
    fn test_unknown_labels_still_list() {
        let conn = test_conn();
        let diesel = factor(&conn, "Diesel", 1.0);
        let fleet = source(&conn, diesel.id, GhgScope::Scope1);
        conn.execute(
            "INSERT INTO emission_sources (name, source_type, scope, factor_id)
             VALUES ('Imported site', 'Combustion mobile', 'Alcance 1', ?1)",
            [diesel.id],
        )
        .unwrap();
        let imported = conn.last_insert_rowid();

        let listed = list_sources(&conn, Page::default()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], fleet);
        assert_eq!(listed[1].scope, "Alcance 1");
        assert_eq!(listed[1].source_type, "Combustion mobile");

        let fetched = get_source(&conn, imported).unwrap().unwrap();
        assert_eq!(fetched.factor.map(|f| f.id), Some(diesel.id));
    }

    #[test]
    fn test_seed_default_factors_skips_existing() {
        let conn = test_conn();
        factor(&conn, "Diesel", 2.7);

        let inserted = seed_default_factors(
            &conn,
            &DefaultFactors {
                electricity_kwh: 0.82,
                gasoline_liter: 2.31,
                diesel_liter: 2.68,
            },
        )
        .unwrap();
        assert_eq!(inserted, 2);

        let diesel = find_factor_by_name(&conn, "Diesel").unwrap().unwrap();
        assert_eq!(diesel.value, 2.7);
        assert_eq!(list_factors(&conn, Page::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut conn = test_conn();
        let diesel = factor(&conn, "Diesel", 2.68);
        let fleet = source(&conn, diesel.id, GhgScope::Scope1);

        let rows = vec![
            NewActivityData {
                value: 5.0,
                unit: "liter".to_string(),
                activity_date: date(2024, 1, 2),
                source_id: fleet.id,
            },
            NewActivityData {
                value: 5.0,
                unit: "liter".to_string(),
                activity_date: date(2024, 1, 3),
                source_id: fleet.id + 100,
            },
        ];
        assert!(import_activities(&mut conn, rows).is_err());
        assert_eq!(crate::db::count_rows(&conn, "activity_data").unwrap(), 0);
    }
}
