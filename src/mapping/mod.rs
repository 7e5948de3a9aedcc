//! Pure header and row mapping.
//!
//! The mapping layer turns raw rows produced by a [`crate::workbook::RowCursor`] into JSON row
//! objects. It has no failure modes and no side effects.
//!
//! - [`normalize_headers()`]: header row to canonical keys
//! - [`map_row()`]: data row to a [`crate::types::RowObject`]
//! - [`is_empty_row()`]: detects rows whose values are all `null`
//!
//! ## Example
//!
//! ```rust
//! use sheet_json::mapping::{is_empty_row, map_row, normalize_headers};
//! use serde_json::json;
//!
//! let headers = normalize_headers(&[Some("First Name".to_string()), Some(" Age ".to_string())]);
//! assert_eq!(headers, vec!["first_name", "age"]);
//!
//! let obj = map_row(&headers, &[Some("Alice".to_string())]);
//! assert_eq!(serde_json::Value::Object(obj.clone()), json!({"first_name": "Alice", "age": null}));
//! assert!(!is_empty_row(&obj));
//! ```

pub mod headers;
pub mod row;

pub use headers::{normalize_header, normalize_headers};
pub use row::{is_empty_row, map_row};
