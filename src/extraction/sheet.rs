//! Single-sheet extraction.

use crate::error::{ExtractionError, ExtractionResult};
use crate::mapping::{is_empty_row, map_row, normalize_headers};
use crate::types::{CellMode, EmptyRowPolicy, SheetRows};
use crate::workbook::SheetSource;

use super::cancel::CancellationToken;

/// Default row cap per sheet. Large enough to never matter for real workbooks while still bounding
/// memory on pathological input.
pub const DEFAULT_MAX_ROWS: u64 = 10_000_000_000;

/// Per-sheet extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetOptions {
    /// Cell representation for data rows. The header row is always read formatted.
    pub cell_mode: CellMode,
    /// Whether fully-empty data rows are dropped.
    pub empty_rows: EmptyRowPolicy,
    /// Stop once this many rows have been emitted. Must be > 0.
    pub max_rows: u64,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            cell_mode: CellMode::default(),
            empty_rows: EmptyRowPolicy::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// Stream `sheet` to completion (or cancellation) and map every data row to a row object.
///
/// Behavior:
/// - The first row is the header row; it is normalized once and never emitted
/// - Cancellation is checked before every row read; a cancelled sheet returns
///   [`ExtractionError::Cancelled`] and no partial data
/// - With [`EmptyRowPolicy::Skip`], fully-null rows are dropped without counting toward the cap
/// - Reaching `max_rows` ends the sheet early with [`SheetRows::truncated`] set
pub fn extract_sheet(
    source: &dyn SheetSource,
    sheet: &str,
    cancel: &CancellationToken,
    opts: &SheetOptions,
) -> ExtractionResult<SheetRows> {
    let mut cursor = source.open_rows(sheet)?;
    let mut out = SheetRows::empty(sheet);

    let cancelled = || ExtractionError::Cancelled {
        sheet: sheet.to_string(),
    };

    if cancel.is_cancelled() {
        return Err(cancelled());
    }
    let headers = match cursor.next_row(CellMode::Formatted) {
        Some(row) => normalize_headers(&row?),
        None => return Ok(out),
    };

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let Some(row) = cursor.next_row(opts.cell_mode) else {
            break;
        };
        let row = row?;

        let obj = map_row(&headers, &row);
        if opts.empty_rows == EmptyRowPolicy::Skip && is_empty_row(&obj) {
            out.skipped_empty += 1;
            continue;
        }

        out.rows.push(obj);
        if out.rows.len() as u64 >= opts.max_rows {
            out.truncated = true;
            break;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{extract_sheet, SheetOptions};
    use crate::error::{ExtractionError, ExtractionResult};
    use crate::extraction::CancellationToken;
    use crate::types::{Cell, CellMode, EmptyRowPolicy};
    use crate::workbook::{MemoryWorkbook, RowCursor, SheetSource};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn s(v: &str) -> Cell {
        Some(v.to_string())
    }

    fn data_sheet() -> MemoryWorkbook {
        MemoryWorkbook::new().with_cells(
            "Data",
            vec![
                vec![s("First Name"), s(" Age ")],
                vec![s("Alice"), s("30")],
                vec![s("Bob"), s("")],
                vec![],
                vec![s("Carol")],
            ],
        )
    }

    fn as_json(rows: &[crate::types::RowObject]) -> Value {
        Value::Array(rows.iter().cloned().map(Value::Object).collect())
    }

    #[test]
    fn maps_rows_and_skips_fully_empty_ones() {
        let wb = data_sheet();
        let out = extract_sheet(&wb, "Data", &CancellationToken::new(), &SheetOptions::default()).unwrap();

        assert_eq!(
            as_json(&out.rows),
            json!([
                {"first_name": "Alice", "age": "30"},
                {"first_name": "Bob", "age": ""},
                {"first_name": "Carol", "age": null},
            ])
        );
        assert_eq!(out.skipped_empty, 1);
        assert!(!out.truncated);
    }

    #[test]
    fn keep_policy_emits_empty_rows() {
        let wb = data_sheet();
        let opts = SheetOptions {
            empty_rows: EmptyRowPolicy::Keep,
            ..SheetOptions::default()
        };
        let out = extract_sheet(&wb, "Data", &CancellationToken::new(), &opts).unwrap();

        assert_eq!(out.row_count(), 4);
        assert_eq!(Value::Object(out.rows[2].clone()), json!({"first_name": null, "age": null}));
        assert_eq!(out.skipped_empty, 0);
    }

    #[test]
    fn every_row_has_one_key_per_header() {
        let wb = MemoryWorkbook::new().with_sheet(
            "S",
            vec![vec!["a", "b", "c"], vec!["1"], vec!["1", "2", "3", "4", "5"]],
        );
        let out = extract_sheet(&wb, "S", &CancellationToken::new(), &SheetOptions::default()).unwrap();
        assert!(out.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn row_cap_truncates_without_error() {
        let wb = MemoryWorkbook::new().with_cells(
            "S",
            vec![vec![s("n")], vec![], vec![s("1")], vec![], vec![s("2")], vec![s("3")]],
        );
        let opts = SheetOptions {
            max_rows: 2,
            ..SheetOptions::default()
        };
        let out = extract_sheet(&wb, "S", &CancellationToken::new(), &opts).unwrap();

        assert_eq!(as_json(&out.rows), json!([{"n": "1"}, {"n": "2"}]));
        assert!(out.truncated);
        // Empty rows before the cap do not count toward it.
        assert_eq!(out.skipped_empty, 2);
    }

    #[test]
    fn header_only_and_empty_sheets_yield_no_rows() {
        let wb = MemoryWorkbook::new()
            .with_sheet("HeaderOnly", vec![vec!["a"]])
            .with_sheet("Empty", Vec::<Vec<&str>>::new());
        let token = CancellationToken::new();
        let opts = SheetOptions::default();
        assert!(extract_sheet(&wb, "HeaderOnly", &token, &opts).unwrap().rows.is_empty());
        assert!(extract_sheet(&wb, "Empty", &token, &opts).unwrap().rows.is_empty());
    }

    #[test]
    fn missing_sheet_fails_to_open() {
        let wb = data_sheet();
        let err = extract_sheet(&wb, "data", &CancellationToken::new(), &SheetOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::SheetOpen { .. }));
    }

    #[test]
    fn cancelled_token_returns_no_partial_data() {
        let wb = data_sheet();
        let token = CancellationToken::new();
        token.cancel();
        let err = extract_sheet(&wb, "Data", &token, &SheetOptions::default()).unwrap_err();
        assert!(err.is_cancelled());
    }

    /// Emits rows forever and cancels the shared token after a fixed number of reads.
    struct CancelAfter {
        token: CancellationToken,
        after: usize,
        modes: std::sync::Arc<std::sync::Mutex<Vec<CellMode>>>,
        reads: AtomicUsize,
    }

    impl RowCursor for CancelAfter {
        fn next_row(&mut self, mode: CellMode) -> Option<ExtractionResult<Vec<Cell>>> {
            self.modes.lock().unwrap().push(mode);
            if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
                self.token.cancel();
            }
            Some(Ok(vec![Some("x".to_string())]))
        }
    }

    struct Endless {
        names: Vec<String>,
        token: CancellationToken,
        modes: std::sync::Arc<std::sync::Mutex<Vec<CellMode>>>,
    }

    impl SheetSource for Endless {
        fn sheet_names(&self) -> &[String] {
            &self.names
        }

        fn open_rows(&self, _sheet: &str) -> ExtractionResult<Box<dyn RowCursor + '_>> {
            Ok(Box::new(CancelAfter {
                token: self.token.clone(),
                after: 5,
                modes: self.modes.clone(),
                reads: AtomicUsize::new(0),
            }))
        }
    }

    #[test]
    fn cancellation_mid_sheet_stops_the_loop() {
        let token = CancellationToken::new();
        let modes = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let src = Endless {
            names: vec!["S".to_string()],
            token: token.clone(),
            modes: modes.clone(),
        };
        let opts = SheetOptions {
            cell_mode: CellMode::Raw,
            ..SheetOptions::default()
        };
        let err = extract_sheet(&src, "S", &token, &opts).unwrap_err();
        assert!(matches!(err, ExtractionError::Cancelled { ref sheet } if sheet == "S"));

        let modes = modes.lock().unwrap();
        assert_eq!(modes.len(), 5);
        assert_eq!(modes[0], CellMode::Formatted);
        assert!(modes[1..].iter().all(|m| *m == CellMode::Raw));
    }
}
