//! Device classes supported by the bench
//!
//! Ties a class to its grid layout and its engine, so front ends can stay
//! generic over what is being tested.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::AcceptanceEngine;
use crate::error::{AcceptanceError, Result};
use crate::ingest::{rectifier_rows, regulator_rows, GridRecord};
use crate::rectifier::RectifierEngine;
use crate::regulator::{self, RegulatorEngine};
use crate::result::AcceptanceResult;
use crate::rows::{RECTIFIER_COLUMNS, REGULATOR_COLUMNS};

/// Class of device under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Automatic voltage regulator (AC out)
    #[serde(alias = "avr")]
    Regulator,
    /// Switched-mode rectifier (DC out)
    #[serde(alias = "smr")]
    Rectifier,
}

impl DeviceClass {
    /// Name shown in the test selector
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Regulator => "AVR Test",
            Self::Rectifier => "SMR Test",
        }
    }

    /// Short tag used in exported file names
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Regulator => "AVR",
            Self::Rectifier => "SMR",
        }
    }

    /// Grid headers in report order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Regulator => &REGULATOR_COLUMNS,
            Self::Rectifier => &RECTIFIER_COLUMNS,
        }
    }

    /// Fewest rows this class can be evaluated on
    pub fn min_rows(&self) -> usize {
        match self {
            Self::Regulator => regulator::MIN_ROWS,
            Self::Rectifier => 0,
        }
    }

    /// Ingest records and build the engine for this class
    ///
    /// The row count is checked before any cell is read, so a short grid is
    /// always [`AcceptanceError::InsufficientData`].
    pub fn engine(&self, records: &[GridRecord]) -> Result<Box<dyn AcceptanceEngine>> {
        if records.len() < self.min_rows() {
            return Err(AcceptanceError::insufficient_data(
                self.min_rows(),
                records.len(),
            ));
        }
        Ok(match self {
            Self::Regulator => Box::new(RegulatorEngine::new(regulator_rows(records)?)?),
            Self::Rectifier => Box::new(RectifierEngine::new(rectifier_rows(records)?)),
        })
    }

    /// Ingest records and evaluate them in one step
    pub fn evaluate_records(&self, records: &[GridRecord]) -> Result<AcceptanceResult> {
        Ok(self.engine(records)?.evaluate())
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DeviceClass {
    type Err = AcceptanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avr" | "regulator" => Ok(Self::Regulator),
            "smr" | "rectifier" => Ok(Self::Rectifier),
            _ => Err(AcceptanceError::unknown_device_class(s)),
        }
    }
}
