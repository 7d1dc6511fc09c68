//! Error types for bench-acceptance

use thiserror::Error;

/// Acceptance evaluation errors
#[derive(Debug, Error, PartialEq)]
pub enum AcceptanceError {
    /// Regulator grids need the reference row at index 2
    #[error("Insufficient data: {required} rows required, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A grid record lacks a field the device class requires
    #[error("Row {row}: missing field '{field}'")]
    MissingField { row: String, field: String },

    /// A grid cell could not be read as a finite number
    #[error("Row {row}: invalid number in '{field}': {value}")]
    InvalidNumber {
        row: String,
        field: String,
        value: String,
    },

    /// Unknown device class name
    #[error("Unknown device class: {0}")]
    UnknownDeviceClass(String),
}

impl AcceptanceError {
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    pub fn missing_field(row: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            row: row.into(),
            field: field.into(),
        }
    }

    pub fn invalid_number(
        row: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidNumber {
            row: row.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn unknown_device_class(name: impl Into<String>) -> Self {
        Self::UnknownDeviceClass(name.into())
    }
}

pub type Result<T> = std::result::Result<T, AcceptanceError>;
