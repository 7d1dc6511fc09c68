//! Grid ingestion
//!
//! The capture grid hands over one flat record per test point, keyed by
//! column header. Cells are numbers or text (numeric text from CSV, or the
//! `--` marker for regulation points that were not measured).
//!
//! Ingestion is strict for both device classes: a missing field, an
//! unparsable cell or a non-finite value rejects the whole grid. Only the
//! regulation columns accept the `--` marker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{AcceptanceError, Result};
use crate::row_ids::row_id;
use crate::rows::{columns, RectifierRow, RegulatorRow};

/// Marker for a measurement that does not apply to this test point
pub const NOT_APPLICABLE: &str = "--";

/// A single grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridValue {
    Number(f64),
    Text(String),
}

impl GridValue {
    /// True for the `--` marker (surrounding whitespace ignored)
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, GridValue::Text(text) if text.trim() == NOT_APPLICABLE)
    }
}

impl From<f64> for GridValue {
    fn from(value: f64) -> Self {
        GridValue::Number(value)
    }
}

impl From<&str> for GridValue {
    fn from(value: &str) -> Self {
        GridValue::Text(value.to_string())
    }
}

impl From<String> for GridValue {
    fn from(value: String) -> Self {
        GridValue::Text(value)
    }
}

/// One captured grid row: column header → cell
pub type GridRecord = BTreeMap<String, GridValue>;

fn required_number(record: &GridRecord, index: usize, field: &str) -> Result<f64> {
    let value = record
        .get(field)
        .ok_or_else(|| AcceptanceError::missing_field(row_id(index), field))?;

    let number = match value {
        GridValue::Number(n) => *n,
        GridValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| AcceptanceError::invalid_number(row_id(index), field, text.as_str()))?,
    };

    if !number.is_finite() {
        return Err(AcceptanceError::invalid_number(
            row_id(index),
            field,
            number.to_string(),
        ));
    }
    Ok(number)
}

fn optional_number(record: &GridRecord, index: usize, field: &str) -> Result<Option<f64>> {
    match record.get(field) {
        Some(value) if value.is_not_applicable() => Ok(None),
        _ => required_number(record, index, field).map(Some),
    }
}

impl RegulatorRow {
    /// Read a regulator row from a grid record at `index`
    pub fn from_record(record: &GridRecord, index: usize) -> Result<Self> {
        Ok(Self {
            frequency: required_number(record, index, columns::FREQUENCY)?,
            input_voltage: required_number(record, index, columns::V_IN)?,
            input_current: required_number(record, index, columns::I_IN)?,
            input_power_kw: required_number(record, index, columns::KW_IN)?,
            output_voltage: required_number(record, index, columns::V_OUT)?,
            output_current: required_number(record, index, columns::I_OUT)?,
            output_power_kw: required_number(record, index, columns::KW_OUT)?,
            output_vthd: required_number(record, index, columns::VTHD_OUT)?,
            efficiency: required_number(record, index, columns::EFFICIENCY)?,
            load_regulation: optional_number(record, index, columns::LOAD_REGULATION)?,
            line_regulation: optional_number(record, index, columns::LINE_REGULATION)?,
        })
    }
}

impl RectifierRow {
    /// Read a rectifier row from a grid record at `index`
    pub fn from_record(record: &GridRecord, index: usize) -> Result<Self> {
        Ok(Self {
            input_voltage: required_number(record, index, columns::V_IN)?,
            input_current: required_number(record, index, columns::I_IN)?,
            input_power: required_number(record, index, columns::P_IN)?,
            power_factor: required_number(record, index, columns::PF_IN)?,
            input_vthd: required_number(record, index, columns::VTHD_IN)?,
            input_ithd: required_number(record, index, columns::ITHD_IN)?,
            output_voltage: required_number(record, index, columns::V_OUT)?,
            output_current: required_number(record, index, columns::I_OUT)?,
            output_power: required_number(record, index, columns::P_OUT)?,
            ripple_mv: required_number(record, index, columns::RIPPLE_OUT)?,
            efficiency: required_number(record, index, columns::EFFICIENCY)?,
        })
    }
}

/// Ingest a full regulator grid
pub fn regulator_rows(records: &[GridRecord]) -> Result<Vec<RegulatorRow>> {
    let rows = records
        .iter()
        .enumerate()
        .map(|(i, record)| RegulatorRow::from_record(record, i))
        .collect::<Result<Vec<_>>>()?;
    debug!("Ingested {} regulator rows", rows.len());
    Ok(rows)
}

/// Ingest a full rectifier grid
pub fn rectifier_rows(records: &[GridRecord]) -> Result<Vec<RectifierRow>> {
    let rows = records
        .iter()
        .enumerate()
        .map(|(i, record)| RectifierRow::from_record(record, i))
        .collect::<Result<Vec<_>>>()?;
    debug!("Ingested {} rectifier rows", rows.len());
    Ok(rows)
}
