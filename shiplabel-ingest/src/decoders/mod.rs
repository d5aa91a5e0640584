//! Document decoder collaborators
//!
//! Binary parsing is not owned by this crate. A decoder turns the raw bytes
//! of an upload into positioned PDF tokens or spreadsheet rows; the
//! heuristics downstream only ever see those.
//!
//! The bundled implementations read JSON dumps produced by an external
//! extraction step (pdf.js `getTextContent()` items, or sheet rows exported
//! as objects).

pub mod json_rows;
pub mod json_tokens;

use crate::models::PageTokens;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

pub use json_rows::JsonRowsDecoder;
pub use json_tokens::JsonTokenDecoder;

/// One spreadsheet row: header → cell text
pub type SpreadsheetRow = BTreeMap<String, String>;

/// Decoder failures
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input bytes are not in the expected format
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// Decoder task failed to run
    #[error("Decoder failed: {0}")]
    Internal(String),
}

/// Positioned-text PDF decoder
#[async_trait]
pub trait PdfDecoder: Send + Sync {
    /// Decode every page of one document
    async fn decode(&self, bytes: &[u8]) -> Result<Vec<PageTokens>, DecodeError>;
}

/// Tabular decoder yielding header→value rows
#[async_trait]
pub trait SpreadsheetDecoder: Send + Sync {
    /// Decode the first sheet of one workbook
    async fn decode(&self, bytes: &[u8]) -> Result<Vec<SpreadsheetRow>, DecodeError>;
}
