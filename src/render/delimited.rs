use crate::render::rows::Table;
use anyhow::{Context, Result};
use std::path::Path;

/// CSV mirror of a sheet: same headers, same cells.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating csv {}", path.display()))?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.cells.iter().map(|c| c.to_text()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing csv {}", path.display()))?;
    Ok(())
}
