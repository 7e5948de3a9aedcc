//! Concurrent per-sheet extraction.
//!
//! This module sits "above" [`crate::mapping`] and [`crate::workbook`] and provides:
//!
//! - [`extract_sheet()`]: stream a single sheet into row objects
//! - [`ExtractionEngine`]: fan-out over the requested sheets on a rayon pool, first-failure
//!   cancellation and ordered, all-or-nothing aggregation
//! - [`CancellationToken`]: cooperative cancellation with optional deadlines
//! - Real-time metrics + observer hooks for monitoring

mod cancel;
mod observer;
pub mod sheet;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{ExtractionError, ExtractionResult};
use crate::types::{CellMode, EmptyRowPolicy, OutputMap, SheetRows};
use crate::workbook::SheetSource;

pub use cancel::{CancellationToken, DropGuard};
pub use observer::{
    ExtractionEvent, ExtractionMetrics, ExtractionMetricsSnapshot, ExtractionObserver, TracingObserver,
};
pub use sheet::{extract_sheet, SheetOptions, DEFAULT_MAX_ROWS};

/// Configuration for the [`ExtractionEngine`].
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Number of worker threads used for sheet extraction.
    ///
    /// If `None` (or `Some(0)`), uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Settings applied to every sheet.
    pub sheet: SheetOptions,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            sheet: SheetOptions::default(),
        }
    }
}

impl ExtractionOptions {
    /// Set the per-sheet row cap.
    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.sheet.max_rows = max_rows;
        self
    }

    /// Set the empty-row policy.
    pub fn with_empty_rows(mut self, policy: EmptyRowPolicy) -> Self {
        self.sheet.empty_rows = policy;
        self
    }

    /// Set the data-row cell representation.
    pub fn with_cell_mode(mut self, mode: CellMode) -> Self {
        self.sheet.cell_mode = mode;
        self
    }
}

/// Runs sheet extractions concurrently on a dedicated thread pool.
///
/// One engine is meant to be shared by every request of a process.
pub struct ExtractionEngine {
    pool: ThreadPool,
    opts: ExtractionOptions,
    observer: Option<Arc<dyn ExtractionObserver>>,
    metrics: Arc<ExtractionMetrics>,
}

impl ExtractionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`ExtractionError::InvalidOptions`] if `opts.sheet.max_rows == 0`.
    pub fn new(opts: ExtractionOptions) -> ExtractionResult<Self> {
        if opts.sheet.max_rows == 0 {
            return Err(ExtractionError::InvalidOptions {
                message: "max_rows must be > 0".to_string(),
            });
        }

        let n_threads = opts
            .num_threads
            .filter(|n| *n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|idx| format!("sheet-extract-{idx}"))
            .build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExtractionMetrics::new()),
        })
    }

    /// Attach an observer for extraction events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time extraction metrics.
    pub fn metrics(&self) -> Arc<ExtractionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Options this engine was built with.
    pub fn options(&self) -> &ExtractionOptions {
        &self.opts
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Extract `sheets` from `source` concurrently and aggregate them into an [`OutputMap`].
    ///
    /// - One task per sheet is spawned on the engine's pool; every task shares one cancellation
    ///   token derived from `cancel`
    /// - The first error cancels all other sheets and is returned; no partial output is produced
    /// - All tasks have finished by the time this returns, on both success and error paths
    /// - On success the output keeps the order of `sheets`, regardless of completion order
    ///
    /// Blocks the calling thread; async callers should run it in a blocking task.
    pub fn extract(
        &self,
        source: &dyn SheetSource,
        sheets: &[String],
        cancel: &CancellationToken,
    ) -> ExtractionResult<OutputMap> {
        let start = Instant::now();
        self.metrics.on_run_start();
        self.emit(ExtractionEvent::RunStarted { sheets: sheets.len() });

        let token = cancel.child_token();
        let (tx, rx) = mpsc::sync_channel::<(usize, ExtractionResult<SheetRows>)>(sheets.len().max(1));

        let result = self.pool.in_place_scope(|scope| {
            for (idx, sheet) in sheets.iter().enumerate() {
                let tx = tx.clone();
                let token = &token;
                scope.spawn(move |_| {
                    let res = self.extract_one(source, sheet, token);
                    // One buffered slot per sheet, so this never blocks even after the
                    // coordinator stops draining on the first error.
                    let _ = tx.send((idx, res));
                });
            }
            drop(tx);

            let mut slots: Vec<Option<SheetRows>> = (0..sheets.len()).map(|_| None).collect();
            for (idx, res) in rx.iter() {
                match res {
                    Ok(rows) => slots[idx] = Some(rows),
                    Err(e) => {
                        token.cancel();
                        return Err(e);
                    }
                }
            }
            Ok(OutputMap::new(slots.into_iter().flatten().collect()))
        });

        if result.is_err() {
            self.metrics.on_run_failed();
        }
        self.emit(ExtractionEvent::RunFinished {
            elapsed: start.elapsed(),
            ok: result.is_ok(),
            metrics: self.metrics.snapshot(),
        });
        result
    }

    fn extract_one(
        &self,
        source: &dyn SheetSource,
        sheet: &str,
        token: &CancellationToken,
    ) -> ExtractionResult<SheetRows> {
        let start = Instant::now();
        self.metrics.on_sheet_start();
        self.emit(ExtractionEvent::SheetStarted {
            sheet: sheet.to_string(),
        });

        let res = extract_sheet(source, sheet, token, &self.opts.sheet);
        match &res {
            Ok(out) => {
                self.metrics
                    .on_sheet_finished(out.row_count(), out.skipped_empty, out.truncated);
                if out.truncated {
                    self.emit(ExtractionEvent::RowCapReached {
                        sheet: sheet.to_string(),
                        rows: out.row_count(),
                    });
                }
                self.emit(ExtractionEvent::SheetFinished {
                    sheet: sheet.to_string(),
                    rows: out.row_count(),
                    skipped_empty: out.skipped_empty,
                    elapsed: start.elapsed(),
                });
            }
            Err(ExtractionError::Cancelled { .. }) => {
                self.metrics.on_sheet_cancelled();
                self.emit(ExtractionEvent::SheetCancelled {
                    sheet: sheet.to_string(),
                });
            }
            Err(e) => {
                self.metrics.on_sheet_failed();
                self.emit(ExtractionEvent::SheetFailed {
                    sheet: sheet.to_string(),
                    error: e.to_string(),
                });
            }
        }
        res
    }

    fn emit(&self, event: ExtractionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Choose which sheets to extract.
///
/// If `requested` is non-empty and names an existing sheet (case-sensitive), only that sheet is
/// returned. Otherwise every sheet is returned in declared order.
pub fn resolve_sheets(available: &[String], requested: Option<&str>) -> Vec<String> {
    match requested {
        Some(name) if !name.is_empty() && available.iter().any(|s| s == name) => vec![name.to_string()],
        _ => available.to_vec(),
    }
}
