//! Row-to-object mapping.

use serde_json::Value;

use crate::types::{Cell, RowObject};

/// Map one data row onto the normalized `headers`.
///
/// The result has one entry per header. Cells past the end of `row` (or absent cells) become
/// `null`, and cells beyond the last header are ignored. When a key repeats, the later column wins.
pub fn map_row(headers: &[String], row: &[Cell]) -> RowObject {
    let mut out = RowObject::with_capacity(headers.len());
    for (idx, key) in headers.iter().enumerate() {
        let value = match row.get(idx) {
            Some(Some(s)) => Value::String(s.clone()),
            _ => Value::Null,
        };
        out.insert(key.clone(), value);
    }
    out
}

/// True if every value of `obj` is `null` (including an object with no keys).
pub fn is_empty_row(obj: &RowObject) -> bool {
    obj.values().all(Value::is_null)
}
