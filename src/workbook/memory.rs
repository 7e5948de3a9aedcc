use crate::error::{ExtractionError, ExtractionResult};
use crate::types::{Cell, CellMode};

use super::{RowCursor, SheetSource};

/// An in-memory workbook made of pre-rendered cells.
///
/// Cell modes are ignored: cells are returned exactly as stored.
///
/// ```rust
/// use sheet_json::workbook::{MemoryWorkbook, SheetSource};
///
/// let wb = MemoryWorkbook::new()
///     .with_sheet("Data", vec![vec!["id", "name"], vec!["1", "Ada"]]);
/// assert_eq!(wb.sheet_names(), ["Data".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    names: Vec<String>,
    sheets: Vec<Vec<Vec<Cell>>>,
}

impl MemoryWorkbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet whose cells are all present.
    pub fn with_sheet<S: Into<String>>(self, name: impl Into<String>, rows: Vec<Vec<S>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| Some(c.into())).collect())
            .collect();
        self.with_cells(name, rows)
    }

    /// Append a sheet with explicit (possibly absent) cells.
    pub fn with_cells(mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        self.names.push(name.into());
        self.sheets.push(rows);
        self
    }
}

impl SheetSource for MemoryWorkbook {
    fn sheet_names(&self) -> &[String] {
        &self.names
    }

    fn open_rows(&self, sheet: &str) -> ExtractionResult<Box<dyn RowCursor + '_>> {
        let idx = self
            .names
            .iter()
            .position(|n| n == sheet)
            .ok_or_else(|| ExtractionError::SheetOpen {
                sheet: sheet.to_string(),
                message: "no such sheet in workbook".to_string(),
            })?;
        Ok(Box::new(MemoryCursor {
            rows: self.sheets[idx].iter(),
        }))
    }
}

struct MemoryCursor<'a> {
    rows: std::slice::Iter<'a, Vec<Cell>>,
}

impl RowCursor for MemoryCursor<'_> {
    fn next_row(&mut self, _mode: CellMode) -> Option<ExtractionResult<Vec<Cell>>> {
        self.rows.next().map(|row| Ok(row.clone()))
    }
}
