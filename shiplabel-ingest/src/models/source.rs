//! Import sources and their raw payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of document an import batch comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Tabular export, already decoded to column→value rows
    Spreadsheet,
    /// Shipping label PDF, decoded to positioned text tokens
    Pdf,
    /// Label text pasted by the user
    #[serde(rename = "text")]
    PastedText,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Spreadsheet => "spreadsheet",
            SourceKind::Pdf => "pdf",
            SourceKind::PastedText => "text",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spreadsheet" | "sheet" | "xlsx" => Ok(SourceKind::Spreadsheet),
            "pdf" => Ok(SourceKind::Pdf),
            "text" | "pasted-text" | "pasted_text" => Ok(SourceKind::PastedText),
            other => Err(format!("unknown source kind '{}'", other)),
        }
    }
}

/// Raw payload of one import attempt
#[derive(Debug, Clone)]
pub enum ImportInput {
    Spreadsheet(Vec<u8>),
    Pdf(Vec<u8>),
    PastedText(String),
}

impl ImportInput {
    pub fn kind(&self) -> SourceKind {
        match self {
            ImportInput::Spreadsheet(_) => SourceKind::Spreadsheet,
            ImportInput::Pdf(_) => SourceKind::Pdf,
            ImportInput::PastedText(_) => SourceKind::PastedText,
        }
    }

    /// Wrap file contents according to `kind`
    ///
    /// Pasted text must be UTF-8; invalid sequences are replaced.
    pub fn from_bytes(kind: SourceKind, bytes: Vec<u8>) -> Self {
        match kind {
            SourceKind::Spreadsheet => ImportInput::Spreadsheet(bytes),
            SourceKind::Pdf => ImportInput::Pdf(bytes),
            SourceKind::PastedText => {
                ImportInput::PastedText(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

/// One positioned text fragment from a PDF page
///
/// `y` grows upward (PDF user space), so larger `y` is nearer the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page: u32,
}

impl RawToken {
    pub fn new(text: impl Into<String>, x: f64, y: f64, page: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            page,
        }
    }
}

/// Tokens of a single page, in decoder order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTokens {
    pub page: u32,
    pub tokens: Vec<RawToken>,
}
