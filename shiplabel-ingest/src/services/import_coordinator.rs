//! Import orchestration
//!
//! One call of [`ImportCoordinator::import_batch`] takes a raw upload through
//! decode → extraction → normalization → duplicate gate → store. Nothing is
//! written until every candidate has been extracted and normalized, and a
//! batch is inserted whole or not at all.
//!
//! User-facing progress is published on the [`EventBus`]: a loading
//! indicator around decoding and one success or failure notification per
//! batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use shiplabel_common::config::{PdfConfig, TimeoutConfig};
use shiplabel_common::events::{EventBus, LabelEvent};
use shiplabel_common::time;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::duplicate_reconciler::find_conflicts;
use super::field_extractor::{ExtractionFailure, PdfLabelExtractor, TextLabelExtractor};
use super::layout_reconstructor::reconstruct_pages;
use super::record_book::RecordBook;
use super::record_normalizer::{drafts_from_rows, normalize_all};
use crate::decoders::{
    DecodeError, JsonRowsDecoder, JsonTokenDecoder, PdfDecoder, SpreadsheetDecoder,
};
use crate::models::{AddressDraft, AddressRecord, ImportInput, SourceKind};

/// Why an import batch was not stored
#[derive(Debug, Error)]
pub enum ImportError {
    /// Upload could not be decoded, timed out, or held no rows
    #[error("Decode failed: {0}")]
    Decode(String),

    /// No confident address in the document
    #[error("Address not found ({})", .0.code())]
    Extraction(ExtractionFailure),

    /// At least one candidate already exists; nothing was inserted
    #[error("{conflicts} address(es) already exist")]
    DuplicateConflict { conflicts: usize },

    /// Store call failed or timed out
    #[error("Store error: {0}")]
    Store(String),

    /// Cancelled before anything was written
    #[error("Import cancelled")]
    Cancelled,
}

impl ImportError {
    /// Stable error kind for events and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Decode(_) => "decode",
            ImportError::Extraction(_) => "extraction",
            ImportError::DuplicateConflict { .. } => "duplicate",
            ImportError::Store(_) => "store",
            ImportError::Cancelled => "cancelled",
        }
    }
}

impl From<DecodeError> for ImportError {
    fn from(err: DecodeError) -> Self {
        ImportError::Decode(err.to_string())
    }
}

impl From<ExtractionFailure> for ImportError {
    fn from(failure: ExtractionFailure) -> Self {
        ImportError::Extraction(failure)
    }
}

impl From<shiplabel_common::Error> for ImportError {
    fn from(err: shiplabel_common::Error) -> Self {
        ImportError::Store(err.to_string())
    }
}

/// A stored batch and the refreshed record list
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub inserted: usize,
    /// Every stored record, newest first
    pub records: Vec<AddressRecord>,
}

pub struct ImportCoordinator {
    book: Arc<RecordBook>,
    event_bus: EventBus,
    pdf_decoder: Arc<dyn PdfDecoder>,
    spreadsheet_decoder: Arc<dyn SpreadsheetDecoder>,
    pdf_extractor: PdfLabelExtractor,
    text_extractor: TextLabelExtractor,
    decode_timeout: Duration,
}

impl ImportCoordinator {
    /// Coordinator using the JSON dump decoders
    pub fn new(
        book: Arc<RecordBook>,
        event_bus: EventBus,
        pdf_config: &PdfConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            book,
            event_bus,
            pdf_decoder: Arc::new(JsonTokenDecoder::new()),
            spreadsheet_decoder: Arc::new(JsonRowsDecoder::new()),
            pdf_extractor: PdfLabelExtractor::new(pdf_config),
            text_extractor: TextLabelExtractor::new(),
            decode_timeout: time::millis_to_duration(timeouts.decode_ms),
        }
    }

    /// Replace the document decoders
    pub fn with_decoders(
        mut self,
        pdf_decoder: Arc<dyn PdfDecoder>,
        spreadsheet_decoder: Arc<dyn SpreadsheetDecoder>,
    ) -> Self {
        self.pdf_decoder = pdf_decoder;
        self.spreadsheet_decoder = spreadsheet_decoder;
        self
    }

    pub fn book(&self) -> &Arc<RecordBook> {
        &self.book
    }

    /// Import one upload as a single all-or-nothing batch
    pub async fn import_batch(
        &self,
        input: ImportInput,
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome, ImportError> {
        let source = input.kind();
        tracing::info!(source = %source, "Import started");
        self.event_bus.emit_lossy(LabelEvent::ImportStarted {
            source: source.to_string(),
            timestamp: time::now(),
        });

        let result = self.run(input, cancel).await;

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    source = %source,
                    inserted = outcome.inserted,
                    total = outcome.records.len(),
                    "Import succeeded"
                );
                self.event_bus.emit_lossy(LabelEvent::ImportSucceeded {
                    source: source.to_string(),
                    inserted: outcome.inserted,
                    timestamp: time::now(),
                });
            }
            Err(err) => {
                tracing::warn!(source = %source, kind = err.kind(), error = %err, "Import failed");
                self.event_bus.emit_lossy(LabelEvent::ImportFailed {
                    source: source.to_string(),
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                    timestamp: time::now(),
                });
            }
        }

        result
    }

    async fn run(
        &self,
        input: ImportInput,
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome, ImportError> {
        let drafts = self.extract(input, cancel).await?;
        let candidates = normalize_all(&drafts, time::today());

        let _gate = self.book.lock_writes().await;
        self.book.ensure_fresh().await?;

        let conflicts = find_conflicts(&candidates, &self.book.read().await);
        if conflicts > 0 {
            return Err(ImportError::DuplicateConflict { conflicts });
        }

        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        let inserted = self.book.insert(&candidates).await? as usize;

        // Rows are committed from here on; a failed re-read only leaves the
        // snapshot stale
        match self.book.refresh().await {
            Ok(total) => {
                self.event_bus.emit_lossy(LabelEvent::RecordsRefreshed {
                    total,
                    timestamp: time::now(),
                });
            }
            Err(e) => {
                tracing::warn!(inserted, error = %e, "Re-read after insert failed, snapshot stale");
            }
        }

        Ok(ImportOutcome {
            inserted,
            records: self.book.records().await,
        })
    }

    /// Decode and extract every candidate draft of one upload
    async fn extract(
        &self,
        input: ImportInput,
        cancel: &CancellationToken,
    ) -> Result<Vec<AddressDraft>, ImportError> {
        match input {
            ImportInput::PastedText(text) => {
                let draft = self.text_extractor.extract(&text)?;
                Ok(vec![draft])
            }
            ImportInput::Pdf(bytes) => {
                let pages = self
                    .decode(SourceKind::Pdf, self.pdf_decoder.decode(&bytes), cancel)
                    .await?;
                let text = reconstruct_pages(&pages);
                let draft = self.pdf_extractor.extract(&text)?;
                Ok(vec![draft])
            }
            ImportInput::Spreadsheet(bytes) => {
                let rows = self
                    .decode(
                        SourceKind::Spreadsheet,
                        self.spreadsheet_decoder.decode(&bytes),
                        cancel,
                    )
                    .await?;
                let drafts = drafts_from_rows(&rows);
                if drafts.is_empty() {
                    return Err(ImportError::Decode("no rows".to_string()));
                }
                Ok(drafts)
            }
        }
    }

    /// Run one decoder call under the decode timeout, racing cancellation
    async fn decode<T, F>(
        &self,
        source: SourceKind,
        call: F,
        cancel: &CancellationToken,
    ) -> Result<T, ImportError>
    where
        F: std::future::Future<Output = Result<T, DecodeError>>,
    {
        self.event_bus.emit_lossy(LabelEvent::DecodeStarted {
            source: source.to_string(),
            timestamp: time::now(),
        });
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ImportError::Cancelled),
            decoded = tokio::time::timeout(self.decode_timeout, call) => match decoded {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(ImportError::from(e)),
                Err(_) => Err(ImportError::Decode(format!(
                    "decoder exceeded {} ms",
                    self.decode_timeout.as_millis()
                ))),
            },
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(source = %source, elapsed_ms, ok = result.is_ok(), "Decode finished");
        self.event_bus.emit_lossy(LabelEvent::DecodeFinished {
            source: source.to_string(),
            elapsed_ms,
            timestamp: time::now(),
        });

        result
    }
}
