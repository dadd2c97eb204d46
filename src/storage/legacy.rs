//! Flattened column encodings for overlay rows
//!
//! Older rows keep string lists as comma-separated text and examples/quotes as
//! JSON text. Reads never fail on these columns: anything that does not decode
//! comes back as an empty list.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{Result, StoreError};

/// Decode a comma-separated list, trimming items and dropping blanks.
///
/// Only commas separate items; quotes and newlines are item text.
pub fn decode_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode a list as one comma-separated line.
///
/// The column has no escaping, so an item containing a comma is rejected.
pub fn encode_list(items: &[String]) -> Result<String> {
    let mut encoded = Vec::with_capacity(items.len());
    for item in items.iter().map(|item| item.trim()).filter(|item| !item.is_empty()) {
        if item.contains(',') {
            return Err(StoreError::InvalidRow(format!(
                "list item contains a comma: '{}'",
                item
            )));
        }
        encoded.push(item);
    }
    Ok(encoded.join(","))
}

/// Decode a JSON array column, substituting an empty list on any failure
pub fn decode_json_list<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::debug!("legacy: undecodable JSON column: {}", e);
        Vec::new()
    })
}

pub fn encode_json_list<T: Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}
