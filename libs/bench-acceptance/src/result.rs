//! Evaluation result types shared by both engines
//!
//! - CellMap: ordered column → row-id mapping
//! - CheckOutcome: the contribution of a single check
//! - AcceptanceResult: final verdict with summary text

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Legend appended to regulator summaries (report colour conventions)
pub const LEGEND: &str = "LEGEND: [RED: FAIL, YELLOW: PASS BUT ABNORMAL, GREEN: PASS]";

/// Summary used when there is nothing to evaluate
pub const NO_DATA: &str = "No Data";

/// Column name → row ids, kept in the order checks produced them
///
/// Summary lines and report highlighting follow check order, so this is an
/// ordered list rather than a hash map. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellMap {
    entries: Vec<(String, Vec<String>)>,
}

impl CellMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ids for a column, replacing any earlier entry in place
    pub fn insert(&mut self, column: impl Into<String>, ids: Vec<String>) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = ids,
            None => self.entries.push((column, ids)),
        }
    }

    /// Row ids for a column (`None` if the column was never checked)
    pub fn get(&self, column: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ids)| ids.as_slice())
    }

    /// Whether the given row id is listed under the column
    pub fn contains(&self, column: &str, id: &str) -> bool {
        self.get(column)
            .is_some_and(|ids| ids.iter().any(|existing| existing == id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Number of columns (including columns with no rows)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any column lists at least one row
    pub fn has_rows(&self) -> bool {
        self.entries.iter().any(|(_, ids)| !ids.is_empty())
    }
}

impl Serialize for CellMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, ids) in &self.entries {
            map.serialize_entry(column, ids)?;
        }
        map.end()
    }
}

/// Contribution of one check to the final result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub invalid: Vec<(&'static str, Vec<String>)>,
    pub abnormal: Vec<(&'static str, Vec<String>)>,
}

impl CheckOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record failing rows for a column
    pub fn invalid(mut self, column: &'static str, ids: Vec<String>) -> Self {
        self.invalid.push((column, ids));
        self
    }

    /// Record passing-but-suspicious rows for a column
    pub fn abnormal(mut self, column: &'static str, ids: Vec<String>) -> Self {
        self.abnormal.push((column, ids));
        self
    }

    /// Ids recorded as invalid for a column by this check
    pub fn invalid_ids(&self, column: &str) -> Option<&[String]> {
        self.invalid
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, ids)| ids.as_slice())
    }

    /// Ids recorded as abnormal for a column by this check
    pub fn abnormal_ids(&self, column: &str) -> Option<&[String]> {
        self.abnormal
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, ids)| ids.as_slice())
    }
}

/// Merge check contributions in order into (invalid, abnormal) maps
pub fn merge_outcomes<I>(outcomes: I) -> (CellMap, CellMap)
where
    I: IntoIterator<Item = CheckOutcome>,
{
    let mut invalid = CellMap::new();
    let mut abnormal = CellMap::new();
    for outcome in outcomes {
        for (column, ids) in outcome.invalid {
            invalid.insert(column, ids);
        }
        for (column, ids) in outcome.abnormal {
            abnormal.insert(column, ids);
        }
    }
    (invalid, abnormal)
}

/// Final acceptance verdict for one grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptanceResult {
    /// True iff no column has an invalid row
    pub passed: bool,

    /// Human-readable multi-line summary
    pub summary: String,

    /// Column → row ids that failed
    pub invalid_cells: CellMap,

    /// Column → row ids that passed but look suspicious
    pub abnormal_cells: CellMap,

    /// Diagnostics raised during evaluation (not part of the summary)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AcceptanceResult {
    /// Build a result from merged cells
    ///
    /// `header` is emitted as the first summary line when present and the
    /// legend is appended after the RESULT line when `legend` is set.
    pub fn from_cells(
        invalid_cells: CellMap,
        abnormal_cells: CellMap,
        header: Option<String>,
        legend: bool,
    ) -> Self {
        let passed = !invalid_cells.has_rows();

        let mut lines: Vec<String> = header.into_iter().collect();
        for (column, ids) in invalid_cells.iter() {
            if !ids.is_empty() {
                lines.push(format!("Invalid {} in rows: {}", column, ids.join(", ")));
            }
        }
        for (column, ids) in abnormal_cells.iter() {
            if !ids.is_empty() {
                lines.push(format!("Abnormal {} in rows: {}", column, ids.join(", ")));
            }
        }
        lines.push(format!("RESULT: {}", if passed { "PASS" } else { "FAIL" }));
        if legend {
            lines.push(LEGEND.to_string());
        }

        Self {
            passed,
            summary: lines.join("\n"),
            invalid_cells,
            abnormal_cells,
            warnings: Vec::new(),
        }
    }

    /// Degenerate failing result for an empty grid
    pub fn no_data() -> Self {
        Self {
            passed: false,
            summary: NO_DATA.to_string(),
            invalid_cells: CellMap::new(),
            abnormal_cells: CellMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}
