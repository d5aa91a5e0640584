//! PDF token dump decoder
//!
//! Accepts the per-page text items emitted by pdf.js `getTextContent()`:
//!
//! ```json
//! [{ "page": 1, "items": [{ "str": "SHIP TO:", "transform": [10, 0, 0, 10, 36.0, 720.5] }] }]
//! ```
//!
//! Items may carry explicit `x`/`y` instead of a `transform` matrix; the
//! translation components (`transform[4]`, `transform[5]`) are the position.

use super::{DecodeError, PdfDecoder};
use crate::models::{PageTokens, RawToken};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PageDump {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    items: Vec<ItemDump>,
}

#[derive(Debug, Deserialize)]
struct ItemDump {
    #[serde(alias = "text")]
    str: String,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    transform: Option<Vec<f64>>,
}

impl ItemDump {
    fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y, self.transform.as_deref()) {
            (Some(x), Some(y), _) => Some((x, y)),
            (_, _, Some(t)) if t.len() >= 6 => Some((t[4], t[5])),
            _ => None,
        }
    }
}

/// Decoder for JSON token dumps
#[derive(Debug, Default, Clone)]
pub struct JsonTokenDecoder;

impl JsonTokenDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Parse a dump synchronously
    pub fn parse(bytes: &[u8]) -> Result<Vec<PageTokens>, DecodeError> {
        let dump: Vec<PageDump> = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::Malformed(format!("token dump: {}", e)))?;

        dump.into_iter()
            .enumerate()
            .map(|(index, page_dump)| {
                let page = page_dump.page.unwrap_or(index as u32 + 1);
                let tokens = page_dump
                    .items
                    .into_iter()
                    .map(|item| {
                        let (x, y) = item.position().ok_or_else(|| {
                            DecodeError::Malformed(format!(
                                "item '{}' on page {} has no position",
                                item.str, page
                            ))
                        })?;
                        Ok(RawToken::new(item.str, x, y, page))
                    })
                    .collect::<Result<Vec<_>, DecodeError>>()?;
                Ok(PageTokens { page, tokens })
            })
            .collect()
    }
}

#[async_trait]
impl PdfDecoder for JsonTokenDecoder {
    async fn decode(&self, bytes: &[u8]) -> Result<Vec<PageTokens>, DecodeError> {
        let owned = bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || Self::parse(&owned))
            .await
            .map_err(|e| DecodeError::Internal(format!("token decode task failed: {}", e)))??;

        tracing::debug!(
            pages = pages.len(),
            tokens = pages.iter().map(|p| p.tokens.len()).sum::<usize>(),
            "Decoded PDF token dump"
        );

        Ok(pages)
    }
}
