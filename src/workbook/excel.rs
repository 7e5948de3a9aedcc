use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::{ExtractionError, ExtractionResult};
use crate::types::{Cell, CellMode};

use super::{RowCursor, SheetSource};

/// A workbook decoded with `calamine` from an in-memory upload.
///
/// The format (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) is detected from the content.
///
/// calamine readers need exclusive access while loading a sheet, so every call to
/// [`SheetSource::open_rows`] opens its own reader over a cheap clone of the shared bytes. Sheet
/// tasks therefore never share decoder state.
#[derive(Debug, Clone)]
pub struct ExcelWorkbook {
    data: Bytes,
    sheet_names: Vec<String>,
}

impl ExcelWorkbook {
    /// Decode `data` and read its sheet list.
    ///
    /// Fails with [`ExtractionError::Decode`] if the bytes are not a supported workbook.
    pub fn from_bytes(data: impl Into<Bytes>) -> ExtractionResult<Self> {
        let data = data.into();
        let workbook = open_workbook_auto_from_rs(Cursor::new(data.clone()))?;
        let sheet_names = workbook.sheet_names();
        Ok(Self { data, sheet_names })
    }

    /// Size of the underlying upload in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl SheetSource for ExcelWorkbook {
    fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn open_rows(&self, sheet: &str) -> ExtractionResult<Box<dyn RowCursor + '_>> {
        if !self.sheet_names.iter().any(|s| s == sheet) {
            return Err(ExtractionError::SheetOpen {
                sheet: sheet.to_string(),
                message: "no such sheet in workbook".to_string(),
            });
        }

        let open_err = |message: String| ExtractionError::SheetOpen {
            sheet: sheet.to_string(),
            message,
        };
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(self.data.clone())).map_err(|e| open_err(e.to_string()))?;
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| open_err(e.to_string()))?;

        Ok(Box::new(RangeCursor::new(range)))
    }
}

/// Cursor over an already-loaded sheet range, anchored at cell A1.
///
/// calamine ranges start at the first used cell. Rows above that origin are emitted as empty rows
/// and columns left of it are padded with empty strings, so the first row read is always the
/// sheet's physical first row.
struct RangeCursor {
    range: Range<Data>,
    /// Absolute (row, column) of the range's first cell.
    origin: (usize, usize),
    /// Absolute row count including the rows above `origin`.
    height: usize,
    width: usize,
    next: usize,
}

impl RangeCursor {
    fn new(range: Range<Data>) -> Self {
        let (rows, width) = range.get_size();
        let origin = range
            .start()
            .map_or((0, 0), |(row, col)| (row as usize, col as usize));
        let height = if rows == 0 { 0 } else { origin.0 + rows };
        Self {
            range,
            origin,
            height,
            width,
            next: 0,
        }
    }
}

impl RowCursor for RangeCursor {
    fn next_row(&mut self, mode: CellMode) -> Option<ExtractionResult<Vec<Cell>>> {
        if self.next >= self.height {
            return None;
        }
        let abs_row = self.next;
        self.next += 1;

        if abs_row < self.origin.0 {
            return Some(Ok(Vec::new()));
        }
        let row = abs_row - self.origin.0;

        // Trailing empty cells are absent, interior ones are empty strings.
        let populated = (0..self.width)
            .rev()
            .find(|&col| !matches!(self.range.get((row, col)), None | Some(Data::Empty)))
            .map_or(0, |col| col + 1);
        if populated == 0 {
            return Some(Ok(Vec::new()));
        }

        let mut cells = Vec::with_capacity(self.origin.1 + populated);
        cells.extend((0..self.origin.1).map(|_| Some(String::new())));
        cells.extend((0..populated).map(|col| {
            let cell = self.range.get((row, col)).unwrap_or(&Data::Empty);
            Some(render_cell(cell, mode))
        }));
        Some(Ok(cells))
    }
}

/// Render one decoded cell as text.
pub(crate) fn render_cell(cell: &Data, mode: CellMode) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => match (mode, b) {
            (CellMode::Raw, true) => "1".to_string(),
            (CellMode::Raw, false) => "0".to_string(),
            (CellMode::Formatted, true) => "TRUE".to_string(),
            (CellMode::Formatted, false) => "FALSE".to_string(),
        },
        Data::DateTime(dt) => match mode {
            CellMode::Raw => dt.as_f64().to_string(),
            CellMode::Formatted if dt.is_duration() => dt.as_f64().to_string(),
            CellMode::Formatted => dt
                .as_datetime()
                .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}
