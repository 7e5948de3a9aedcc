//! Server configuration.
//!
//! Every setting can be given as a command-line flag or through a `SHEET_JSON_*` environment
//! variable; flags win.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::extraction::{ExtractionOptions, SheetOptions, DEFAULT_MAX_ROWS};
use crate::types::{CellMode, EmptyRowPolicy};

/// Runtime configuration for the `sheet-json` server.
#[derive(Debug, Clone, Parser)]
#[command(name = "sheet-json")]
#[command(version, about = "Convert uploaded spreadsheet workbooks to JSON over HTTP", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "SHEET_JSON_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Maximum number of rows emitted per sheet; extra rows are dropped
    #[arg(
        long,
        env = "SHEET_JSON_MAX_ROWS",
        default_value_t = DEFAULT_MAX_ROWS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_rows: u64,

    /// Worker threads for sheet extraction (defaults to available parallelism)
    #[arg(long, env = "SHEET_JSON_THREADS")]
    pub threads: Option<usize>,

    /// What to do with data rows that have no values
    #[arg(long, value_enum, env = "SHEET_JSON_EMPTY_ROWS", default_value_t = EmptyRowPolicy::Skip)]
    pub empty_rows: EmptyRowPolicy,

    /// Cell representation for data rows (headers are always formatted)
    #[arg(long, value_enum, env = "SHEET_JSON_CELL_MODE", default_value_t = CellMode::Raw)]
    pub cell_mode: CellMode,

    /// Maximum accepted upload size in MiB
    #[arg(long, env = "SHEET_JSON_MAX_UPLOAD_MB", default_value_t = 64)]
    pub max_upload_mb: usize,

    /// Abort extraction of a request after this many seconds
    #[arg(long, env = "SHEET_JSON_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Extraction engine options derived from this configuration.
    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            num_threads: self.threads,
            sheet: SheetOptions {
                cell_mode: self.cell_mode,
                empty_rows: self.empty_rows,
                max_rows: self.max_rows,
            },
        }
    }

    /// Per-request extraction deadline, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
