//! Spreadsheet row export decoder
//!
//! Accepts the first sheet exported as an array of objects, one per data
//! row, keyed by header. Numbers and booleans are stringified; nulls are
//! dropped so they read as absent cells.

use super::{DecodeError, SpreadsheetDecoder, SpreadsheetRow};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Decoder for JSON row exports
#[derive(Debug, Default, Clone)]
pub struct JsonRowsDecoder;

impl JsonRowsDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Parse an export synchronously
    pub fn parse(bytes: &[u8]) -> Result<Vec<SpreadsheetRow>, DecodeError> {
        let rows: Vec<Map<String, Value>> = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::Malformed(format!("row export: {}", e)))?;

        Ok(rows.into_iter().map(row_from_object).collect())
    }
}

fn row_from_object(object: Map<String, Value>) -> SpreadsheetRow {
    object
        .into_iter()
        .filter_map(|(header, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            Some((header, text))
        })
        .collect()
}

#[async_trait]
impl SpreadsheetDecoder for JsonRowsDecoder {
    async fn decode(&self, bytes: &[u8]) -> Result<Vec<SpreadsheetRow>, DecodeError> {
        let rows = Self::parse(bytes)?;
        tracing::debug!(rows = rows.len(), "Decoded spreadsheet rows");
        Ok(rows)
    }
}
