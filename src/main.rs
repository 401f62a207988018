use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::Path;

use ems_records::store::ghg::{import_activities, list_activity_for_period, seed_default_factors};
use ems_records::{
    count_rows, load_activity_csv, logging, open_database, summarize, Config, InventorySummary,
};

const USAGE: &str = "Usage:
  ems-records init
  ems-records seed-factors
  ems-records import-activity <csv>
  ems-records inventory <start YYYY-MM-DD> <end YYYY-MM-DD>";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;
    logging::init(&config);

    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["init"] => run_init(&config),
        ["seed-factors"] => run_seed(&config),
        ["import-activity", path] => run_import(&config, Path::new(path)),
        ["inventory", start, end] => run_inventory(&config, start, end),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn run_init(config: &Config) -> Result<()> {
    open_database(&config.database_path)?;
    println!("✓ Database ready at {}", config.database_path.display());
    Ok(())
}

fn run_seed(config: &Config) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    let inserted = seed_default_factors(&conn, &config.default_factors)?;
    println!(
        "✓ Inserted {} default emission factors ({} total)",
        inserted,
        count_rows(&conn, "emission_factors")?
    );
    Ok(())
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    println!("📂 Loading {}...", csv_path.display());
    let rows = load_activity_csv(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;

    let mut conn = open_database(&config.database_path)?;
    let inserted = import_activities(&mut conn, rows)?;
    println!(
        "✓ Imported {} activity records ({} in database)",
        inserted,
        count_rows(&conn, "activity_data")?
    );
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", raw))
}

fn inventory_warnings(summary: &InventorySummary) -> Vec<String> {
    let mut warnings = Vec::new();
    if summary.excluded > 0 {
        warnings.push(format!(
            "{} activity records skipped (missing source or emission factor)",
            summary.excluded
        ));
    }
    if summary.unbucketed > 0 {
        warnings.push(format!(
            "{} activity records counted in the total only (scope outside Scope 1/2/3)",
            summary.unbucketed
        ));
    }
    warnings
}

fn run_inventory(config: &Config, start: &str, end: &str) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start > end {
        bail!("start date {} is after end date {}", start, end);
    }

    let conn = open_database(&config.database_path)?;
    let entries = list_activity_for_period(&conn, start, end)?;
    let summary = summarize(&entries);
    for warning in inventory_warnings(&summary) {
        eprintln!("⚠️  {}", warning);
    }

    println!("{}", serde_json::to_string_pretty(&summary.inventory)?);
    Ok(())
}
