//! Spreadsheet-style row identifiers
//!
//! Reports address rows the way the exported sheet does: row 1 is the
//! header, so grid index 0 is reported as `"2"`.

use std::collections::BTreeSet;

/// Offset between a 0-based grid index and its reported row number
pub const ROW_ID_OFFSET: usize = 2;

/// Reported row id for a 0-based grid index
pub fn row_id(index: usize) -> String {
    (index + ROW_ID_OFFSET).to_string()
}

/// Convert per-row flags into ascending row ids
///
/// `[false, true, false, true]` becomes `["3", "5"]`.
pub fn row_ids(flags: &[bool]) -> Vec<String> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, &flag)| flag)
        .map(|(i, _)| row_id(i))
        .collect()
}

/// Union several id sets, numerically sorted and deduplicated
pub fn union_row_ids<'a, I>(sets: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let merged: BTreeSet<usize> = sets
        .into_iter()
        .flatten()
        .filter_map(|id| id.parse::<usize>().ok())
        .collect();
    merged.into_iter().map(|n| n.to_string()).collect()
}
