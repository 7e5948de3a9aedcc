//! `sheet-json` turns uploaded spreadsheet workbooks into JSON.
//!
//! Each worksheet becomes an array of row objects. The first row of a sheet is its header row;
//! headers are normalized (trimmed, lowercased, spaces replaced by `_`) and used as keys for every
//! later row:
//!
//! ```text
//! | First Name |  Age  |        {"Data": [
//! | Alice      | 30    |   ->     {"first_name": "Alice", "age": "30"},
//! | Bob        |       |          {"first_name": "Bob", "age": null}
//!                                 ]}
//! ```
//!
//! Sheets are extracted concurrently. The result is all-or-nothing: if any sheet fails, the other
//! sheets are cancelled and no output is produced.
//!
//! ## Quick example
//!
//! ```rust
//! use sheet_json::extraction::{CancellationToken, ExtractionEngine, ExtractionOptions};
//! use sheet_json::workbook::{MemoryWorkbook, SheetSource};
//!
//! # fn main() -> Result<(), sheet_json::ExtractionError> {
//! let wb = MemoryWorkbook::new().with_sheet(
//!     "Data",
//!     vec![vec!["First Name", " Age "], vec!["Alice", "30"]],
//! );
//! let engine = ExtractionEngine::new(ExtractionOptions::default())?;
//! let out = engine.extract(&wb, wb.sheet_names(), &CancellationToken::new())?;
//! assert_eq!(
//!     serde_json::to_string(&out).unwrap(),
//!     r#"{"Data":[{"first_name":"Alice","age":"30"}]}"#
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Real uploads are decoded with [`workbook::ExcelWorkbook`] (xlsx, xlsm, xlsb, xls, ods).
//!
//! ## Modules
//!
//! - [`mapping`]: header normalization and row-to-object mapping
//! - [`workbook`]: the workbook decoder seam and its implementations
//! - [`extraction`]: per-sheet extraction and the concurrent engine
//! - [`server`]: the axum HTTP surface (`POST /json`)
//! - [`config`]: command-line / environment configuration
//! - [`types`]: cells, row objects and the output map
//! - [`error`]: the error type shared by all of the above

pub mod config;
pub mod error;
pub mod extraction;
pub mod mapping;
pub mod server;
pub mod types;
pub mod workbook;

pub use error::{ExtractionError, ExtractionResult};
