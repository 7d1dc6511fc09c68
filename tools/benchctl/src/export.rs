//! Result export
//!
//! Each evaluation writes three files into the output directory:
//! - `{prefix}_{TAG}_RESULT.json`: site details, verdict and cell maps
//! - `{prefix}_{TAG}_RESULT.csv`: captured values, the per-cell status
//!   matrix and the summary lines, sections separated by blank lines
//! - `{prefix}_{TAG}_SUBMISSION.csv`: the clean sheet handed over with the
//!   device (serial number, date, values only)

use anyhow::{Context, Result};
use bench_acceptance::{annotate, AcceptanceResult, DeviceClass, GridRecord};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::grid::cell_text;

/// Note attached to exports that could not be evaluated
pub const INSUFFICIENT_READINGS_NOTE: &str =
    "Data exported. Acceptance evaluation requires at least 3 readings.";

/// Site and run details written alongside the result
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub site_id: String,
    pub site_name: String,
    pub device: String,
    pub generated_at: String,
    pub rows: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    meta: &'a ReportMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a AcceptanceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

/// Paths of the files written by one export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub submission: PathBuf,
}

impl ExportPaths {
    pub fn new(dir: &Path, prefix: &str, class: DeviceClass) -> Self {
        let stem = format!("{}_{}", prefix, class.tag());
        Self {
            json: dir.join(format!("{stem}_RESULT.json")),
            csv: dir.join(format!("{stem}_RESULT.csv")),
            submission: dir.join(format!("{stem}_SUBMISSION.csv")),
        }
    }
}

/// Timestamp prefix used when none is configured
pub fn timestamp_prefix() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Serial number printed on the submission sheet: the export folder name
pub fn submission_serial(path: &Path) -> String {
    path.parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write the JSON report, the annotated CSV and the submission sheet
///
/// `result` is `None` when the grid was exported without evaluation; the
/// CSV then carries values and `note` instead of statuses and summary.
/// An empty grid is rejected by the submission sheet after the result
/// files are written.
pub fn export(
    paths: &ExportPaths,
    class: DeviceClass,
    records: &[GridRecord],
    meta: &ReportMeta,
    result: Option<&AcceptanceResult>,
    note: Option<&str>,
) -> Result<()> {
    if let Some(dir) = paths.json.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let report = JsonReport { meta, result, note };
    let file = File::create(&paths.json)
        .with_context(|| format!("Failed to create {}", paths.json.display()))?;
    serde_json::to_writer_pretty(file, &report)?;

    write_result_csv(&paths.csv, class, records, result, note)?;

    let date = chrono::Local::now().format("%d-%m-%Y").to_string();
    write_submission(
        &paths.submission,
        class,
        records,
        &submission_serial(&paths.submission),
        &date,
    )?;

    info!(
        "Exported {} result to {}, {} and {}",
        class.tag(),
        paths.json.display(),
        paths.csv.display(),
        paths.submission.display()
    );
    Ok(())
}

fn open_csv(path: &Path) -> Result<csv::Writer<File>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))
}

fn write_values(
    writer: &mut csv::Writer<File>,
    columns: &[&str],
    records: &[GridRecord],
) -> Result<()> {
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|column| cell_text(record.get(*column))))?;
    }
    Ok(())
}

// csv writes an empty record as `""`, so separators go to the file directly
fn blank_line(writer: &mut csv::Writer<File>) -> Result<()> {
    writer.flush()?;
    let mut file: &File = writer.get_ref();
    file.write_all(b"\n")?;
    Ok(())
}

fn write_result_csv(
    path: &Path,
    class: DeviceClass,
    records: &[GridRecord],
    result: Option<&AcceptanceResult>,
    note: Option<&str>,
) -> Result<()> {
    let columns = class.columns();
    let mut writer = open_csv(path)?;
    write_values(&mut writer, columns, records)?;

    if let Some(result) = result {
        blank_line(&mut writer)?;
        writer.write_record(columns)?;
        for row in annotate(columns, records.len(), result) {
            writer.write_record(row.iter().map(|status| status.as_str()))?;
        }

        blank_line(&mut writer)?;
        for line in result.summary.lines() {
            writer.write_record([line])?;
        }
    }

    if let Some(note) = note {
        blank_line(&mut writer)?;
        writer.write_record([note])?;
    }

    writer.flush()?;
    Ok(())
}

/// Values-only sheet submitted with the device
pub fn write_submission(
    path: &Path,
    class: DeviceClass,
    records: &[GridRecord],
    serial: &str,
    date: &str,
) -> Result<()> {
    if records.is_empty() {
        anyhow::bail!("Submission report requires at least 1 row");
    }

    let serial_text = if serial.is_empty() {
        "Serial No. :".to_string()
    } else {
        format!("Serial No. : {serial}")
    };
    let title = format!("{} TEST REPORT", class.tag());

    let mut writer = open_csv(path)?;
    writer.write_record([serial_text.as_str(), title.as_str(), "Date", date])?;
    write_values(&mut writer, class.columns(), records)?;
    writer.flush()?;
    Ok(())
}
