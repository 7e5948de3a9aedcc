//! Workbook access.
//!
//! Extraction never talks to a decoder directly. It goes through [`SheetSource`], which lists sheet
//! names and opens an independent forward-only [`RowCursor`] per sheet. Implementations:
//!
//! - [`ExcelWorkbook`]: decodes uploaded bytes with `calamine` (xlsx, xlsm, xlsb, xls, ods)
//! - [`MemoryWorkbook`]: an in-memory grid of cells, handy for tests and benchmarks
//!
//! Sources are shared by all sheet tasks of a request, so they must be `Send + Sync`. A cursor is
//! owned by exactly one task.

pub mod excel;
pub mod memory;

use crate::error::ExtractionResult;
use crate::types::{Cell, CellMode};

pub use excel::ExcelWorkbook;
pub use memory::MemoryWorkbook;

/// A decoded workbook that can stream the rows of its sheets.
pub trait SheetSource: Send + Sync {
    /// Sheet names in declared order.
    fn sheet_names(&self) -> &[String];

    /// Open a row cursor over `sheet`.
    ///
    /// Fails with [`crate::ExtractionError::SheetOpen`] if the sheet does not exist or cannot be
    /// loaded.
    fn open_rows(&self, sheet: &str) -> ExtractionResult<Box<dyn RowCursor + '_>>;
}

/// Forward-only cursor over the rows of one sheet.
pub trait RowCursor: Send {
    /// Read the next row, rendering cells according to `mode`.
    ///
    /// Returns `None` once the sheet is exhausted. Trailing absent cells are not included, so a
    /// fully-empty row is an empty `Vec`.
    fn next_row(&mut self, mode: CellMode) -> Option<ExtractionResult<Vec<Cell>>>;
}
