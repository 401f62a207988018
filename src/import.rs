// 📥 Bulk activity import
// CSV with a header row: value,unit,activity_date,source_id

use crate::entities::NewActivityData;
use crate::error::{Error, Result};
use std::path::Path;

/// Parse and validate every row. Stops at the first bad row, naming its line.
pub fn load_activity_csv(path: &Path) -> Result<Vec<NewActivityData>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<NewActivityData>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = record?;
        row.validate()
            .map_err(|e| Error::validation(format!("line {}: {}", line, e)))?;
        rows.push(row);
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "Loaded activity CSV");
    Ok(rows)
}
