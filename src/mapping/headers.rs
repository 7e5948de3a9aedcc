//! Header normalization.

use crate::types::Cell;

/// Normalize one header: trim surrounding whitespace, lowercase, replace spaces with `_`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Normalize a header row into the keys used for every later row of the sheet.
///
/// The output has the same length as the input. Absent cells normalize to `""`. Duplicates are
/// kept as-is.
pub fn normalize_headers(raw: &[Cell]) -> Vec<String> {
    raw.iter()
        .map(|cell| normalize_header(cell.as_deref().unwrap_or("")))
        .collect()
}
