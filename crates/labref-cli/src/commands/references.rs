use anyhow::Context;
use labref_core::db::StandardRange;
use std::path::Path;

use super::open_database;
use crate::output;

pub fn import(db_path: Option<&Path>, file: &Path) -> anyhow::Result<()> {
    let db = open_database(db_path)?;

    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let ranges: Vec<StandardRange> =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", file.display()))?;

    for (index, range) in ranges.iter().enumerate() {
        db.insert_standard_range(range)
            .with_context(|| format!("range #{} ({})", index, range.parameter_code))?;
    }

    println!("Imported {} reference range(s)", ranges.len());
    Ok(())
}

pub fn list(db_path: Option<&Path>, parameter_code: &str, output_format: &str) -> anyhow::Result<()> {
    let db = open_database(db_path)?;
    let ranges = db.list_standard_ranges(parameter_code)?;

    match output_format {
        "json" => output::json::print(&ranges)?,
        _ => output::table::print_ranges(parameter_code, &ranges),
    }

    Ok(())
}

pub fn deactivate(db_path: Option<&Path>, id: i64) -> anyhow::Result<()> {
    let db = open_database(db_path)?;

    if db.deactivate_standard_range(id)? {
        println!("Deactivated reference range {id}");
        Ok(())
    } else {
        anyhow::bail!("reference range {id} not found")
    }
}
