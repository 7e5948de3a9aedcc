use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Extraction events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    RunStarted { sheets: usize },
    SheetStarted { sheet: String },
    SheetFinished {
        sheet: String,
        rows: usize,
        skipped_empty: usize,
        elapsed: Duration,
    },
    RowCapReached { sheet: String, rows: usize },
    SheetFailed { sheet: String, error: String },
    SheetCancelled { sheet: String },
    RunFinished {
        elapsed: Duration,
        ok: bool,
        metrics: ExtractionMetricsSnapshot,
    },
}

/// Observer hook for extraction events.
pub trait ExtractionObserver: Send + Sync {
    fn on_event(&self, event: &ExtractionEvent);
}

/// Forwards extraction events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn on_event(&self, event: &ExtractionEvent) {
        match event {
            ExtractionEvent::RunStarted { sheets } => debug!(sheets, "extraction started"),
            ExtractionEvent::SheetStarted { sheet } => debug!(%sheet, "sheet started"),
            ExtractionEvent::SheetFinished {
                sheet,
                rows,
                skipped_empty,
                elapsed,
            } => debug!(%sheet, rows, skipped_empty, ?elapsed, "sheet finished"),
            ExtractionEvent::RowCapReached { sheet, rows } => {
                info!(%sheet, len = rows, "max rows hit, returning rows early")
            }
            ExtractionEvent::SheetFailed { sheet, error } => warn!(%sheet, %error, "sheet failed"),
            ExtractionEvent::SheetCancelled { sheet } => debug!(%sheet, "sheet cancelled"),
            ExtractionEvent::RunFinished { elapsed, ok, metrics } => {
                debug!(?elapsed, ok, %metrics, "extraction finished")
            }
        }
    }
}

/// Cumulative extraction counters.
///
/// One instance lives for the lifetime of an engine and is shared by every concurrent run, so
/// counters only ever grow (except the active-sheet gauge).
pub struct ExtractionMetrics {
    runs_started: AtomicU64,
    runs_failed: AtomicU64,

    sheets_started: AtomicU64,
    sheets_finished: AtomicU64,
    sheets_failed: AtomicU64,
    sheets_cancelled: AtomicU64,
    sheets_truncated: AtomicU64,

    rows_emitted: AtomicU64,
    rows_skipped_empty: AtomicU64,

    active_sheets: AtomicUsize,
    max_active_sheets: AtomicUsize,
}

impl ExtractionMetrics {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            sheets_started: AtomicU64::new(0),
            sheets_finished: AtomicU64::new(0),
            sheets_failed: AtomicU64::new(0),
            sheets_cancelled: AtomicU64::new(0),
            sheets_truncated: AtomicU64::new(0),
            rows_emitted: AtomicU64::new(0),
            rows_skipped_empty: AtomicU64::new(0),
            active_sheets: AtomicUsize::new(0),
            max_active_sheets: AtomicUsize::new(0),
        }
    }

    pub fn on_run_start(&self) {
        let _ = self.runs_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_run_failed(&self) {
        let _ = self.runs_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_sheet_start(&self) {
        let _ = self.sheets_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_sheets.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_sheets.fetch_max(now, Ordering::SeqCst);
    }

    pub fn on_sheet_finished(&self, rows: usize, skipped_empty: usize, truncated: bool) {
        let _ = self.sheets_finished.fetch_add(1, Ordering::SeqCst);
        let _ = self.rows_emitted.fetch_add(rows as u64, Ordering::SeqCst);
        let _ = self
            .rows_skipped_empty
            .fetch_add(skipped_empty as u64, Ordering::SeqCst);
        if truncated {
            let _ = self.sheets_truncated.fetch_add(1, Ordering::SeqCst);
        }
        self.end_sheet();
    }

    pub fn on_sheet_failed(&self) {
        let _ = self.sheets_failed.fetch_add(1, Ordering::SeqCst);
        self.end_sheet();
    }

    pub fn on_sheet_cancelled(&self) {
        let _ = self.sheets_cancelled.fetch_add(1, Ordering::SeqCst);
        self.end_sheet();
    }

    fn end_sheet(&self) {
        let _ = self.active_sheets.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExtractionMetricsSnapshot {
        ExtractionMetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::SeqCst),
            runs_failed: self.runs_failed.load(Ordering::SeqCst),
            sheets_started: self.sheets_started.load(Ordering::SeqCst),
            sheets_finished: self.sheets_finished.load(Ordering::SeqCst),
            sheets_failed: self.sheets_failed.load(Ordering::SeqCst),
            sheets_cancelled: self.sheets_cancelled.load(Ordering::SeqCst),
            sheets_truncated: self.sheets_truncated.load(Ordering::SeqCst),
            rows_emitted: self.rows_emitted.load(Ordering::SeqCst),
            rows_skipped_empty: self.rows_skipped_empty.load(Ordering::SeqCst),
            max_active_sheets: self.max_active_sheets.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExtractionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`ExtractionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMetricsSnapshot {
    pub runs_started: u64,
    pub runs_failed: u64,
    pub sheets_started: u64,
    pub sheets_finished: u64,
    pub sheets_failed: u64,
    pub sheets_cancelled: u64,
    pub sheets_truncated: u64,
    pub rows_emitted: u64,
    pub rows_skipped_empty: u64,
    pub max_active_sheets: usize,
}

impl fmt::Display for ExtractionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={} (failed {}), sheets={}/{} (failed {}, cancelled {}, truncated {}), rows={} (skipped_empty {}), max_active_sheets={}",
            self.runs_started,
            self.runs_failed,
            self.sheets_finished,
            self.sheets_started,
            self.sheets_failed,
            self.sheets_cancelled,
            self.sheets_truncated,
            self.rows_emitted,
            self.rows_skipped_empty,
            self.max_active_sheets
        )
    }
}
