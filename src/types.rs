//! Core data model types for extraction.
//!
//! A sheet is read as a sequence of raw rows of [`Cell`]s. The first row becomes the header set and
//! every later row is mapped into a [`RowObject`]. Per-sheet results are collected into
//! [`SheetRows`], and a whole request produces an [`OutputMap`].

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One raw cell value as produced by a row cursor.
///
/// `None` means the cell is absent (past the last populated cell of the row). An empty cell that
/// sits before the last populated cell is `Some("")`.
pub type Cell = Option<String>;

/// A mapping from normalized header key to cell value (a JSON string or `null`).
///
/// Keys keep header order.
pub type RowObject = serde_json::Map<String, serde_json::Value>;

/// Representation requested from the workbook decoder for cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CellMode {
    /// Underlying stored value: booleans as `1`/`0`, dates as serial numbers.
    #[default]
    Raw,
    /// Display value: booleans as `TRUE`/`FALSE`, dates as `YYYY-MM-DD HH:MM:SS`.
    Formatted,
}

/// What to do with data rows whose values are all `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EmptyRowPolicy {
    /// Drop fully-empty rows. They do not count toward the row cap.
    #[default]
    Skip,
    /// Emit every data row, even if all of its values are `null`.
    Keep,
}

/// Rows extracted from a single sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRows {
    /// Sheet name as declared in the workbook.
    pub sheet: String,
    /// Row objects in sheet order.
    pub rows: Vec<RowObject>,
    /// Number of fully-empty data rows that were dropped.
    pub skipped_empty: usize,
    /// Whether extraction stopped early at the configured row cap.
    pub truncated: bool,
}

impl SheetRows {
    /// Create a result for `sheet` with no rows.
    pub fn empty(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            rows: Vec::new(),
            skipped_empty: 0,
            truncated: false,
        }
    }

    /// Number of emitted rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The full result of a request: sheet name to its array of row objects.
///
/// Sheets are kept in the order they were requested, which is the workbook's declared order unless
/// a single sheet was selected. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMap {
    sheets: Vec<SheetRows>,
}

impl OutputMap {
    /// Create an output map from per-sheet results, keeping their order.
    pub fn new(sheets: Vec<SheetRows>) -> Self {
        Self { sheets }
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// True if no sheet was extracted.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Row objects of `sheet`, if present.
    pub fn get(&self, sheet: &str) -> Option<&[RowObject]> {
        self.sheets
            .iter()
            .find(|s| s.sheet == sheet)
            .map(|s| s.rows.as_slice())
    }

    /// Iterate sheet names in output order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.sheet.as_str())
    }

    /// Iterate per-sheet results in output order.
    pub fn iter(&self) -> impl Iterator<Item = &SheetRows> {
        self.sheets.iter()
    }

    /// Total number of rows across all sheets.
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(SheetRows::row_count).sum()
    }
}

impl Serialize for OutputMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.sheet, &sheet.rows)?;
        }
        map.end()
    }
}
