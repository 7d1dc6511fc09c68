//! Grid loading from CSV or JSON files

use anyhow::{Context, Result};
use bench_acceptance::{GridRecord, GridValue};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Load grid records, choosing the format by file extension
///
/// `.json` files hold an array of records keyed by column header. Anything
/// else is read as CSV with a header row.
pub fn load_records(path: &Path) -> Result<Vec<GridRecord>> {
    if !path.exists() {
        anyhow::bail!("Grid file not found: {}", path.display());
    }

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let records = if is_json {
        load_json(path)?
    } else {
        load_csv(path)?
    };
    debug!("Loaded {} grid rows from {}", records.len(), path.display());
    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<GridRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of grid records", path.display()))
}

fn load_csv(path: &Path) -> Result<Vec<GridRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Malformed CSV row {}", line + 2))?;
        let record: GridRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(header, cell)| (header.to_string(), parse_cell(cell)))
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Numeric text becomes a number, everything else stays text
fn parse_cell(cell: &str) -> GridValue {
    match cell.parse::<f64>() {
        Ok(number) if number.is_finite() => GridValue::Number(number),
        _ => GridValue::Text(cell.to_string()),
    }
}

/// Render a cell back to its CSV text
pub fn cell_text(value: Option<&GridValue>) -> String {
    match value {
        Some(GridValue::Number(number)) => number.to_string(),
        Some(GridValue::Text(text)) => text.clone(),
        None => String::new(),
    }
}
