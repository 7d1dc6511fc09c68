//! Cell annotation for report writers
//!
//! Maps an [`AcceptanceResult`] back onto the grid: every cell is FAIL if
//! its row is listed under its column as invalid, ABNORMAL if listed as
//! abnormal, and PASS otherwise. Columns the result never mentions are PASS.

use serde::Serialize;
use std::fmt;

use crate::result::AcceptanceResult;
use crate::row_ids::row_id;

/// Report colour for failing cells
pub const COLOR_FAIL: &str = "#FFCCCB";

/// Report colour for abnormal cells
pub const COLOR_ABNORMAL: &str = "#FFBF00";

/// Report colour for passing cells
pub const COLOR_PASS: &str = "#90ee90";

/// Status of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CellStatus {
    Pass,
    Abnormal,
    Fail,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Abnormal => "ABNORMAL",
            Self::Fail => "FAIL",
        }
    }

    /// Background colour used by the spreadsheet reports
    pub fn color(&self) -> &'static str {
        match self {
            Self::Pass => COLOR_PASS,
            Self::Abnormal => COLOR_ABNORMAL,
            Self::Fail => COLOR_FAIL,
        }
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status matrix (`row_count` rows × `columns.len()` cells)
pub fn annotate(columns: &[&str], row_count: usize, result: &AcceptanceResult) -> Vec<Vec<CellStatus>> {
    (0..row_count)
        .map(|index| {
            let id = row_id(index);
            columns
                .iter()
                .map(|column| {
                    if result.invalid_cells.contains(column, &id) {
                        CellStatus::Fail
                    } else if result.abnormal_cells.contains(column, &id) {
                        CellStatus::Abnormal
                    } else {
                        CellStatus::Pass
                    }
                })
                .collect()
        })
        .collect()
}
