//! Address field extraction from label lines
//!
//! Both label sources share one approach: find the ship-to anchor, then run
//! a set of independent named [`LineRule`]s over the lines that follow it.
//! Rules never read each other's output. The all-or-nothing company/street
//! check is a single post-condition ([`require_core_fields`]) applied after
//! every rule has run.
//!
//! - [`PdfLabelExtractor`]: reconstructed PDF text, pseudo-lines split on
//!   runs of whitespace, fixed-destination label format
//! - [`TextLabelExtractor`]: pasted text, one line per input line

pub mod pdf_label;
pub mod rules;
pub mod text_label;

use thiserror::Error;

use crate::models::{AddressDraft, AddressField};

pub use pdf_label::PdfLabelExtractor;
pub use rules::{LineRule, RuleSet};
pub use text_label::TextLabelExtractor;

/// Marker that opens the destination block
pub const SHIP_TO_MARKER: &str = "SHIP TO:";

/// Why no confident address could be extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// No ship-to anchor in the document
    #[error("no ship-to section")]
    NoShipToSection,

    /// Anchor found but nothing follows it
    #[error("ship-to section is empty")]
    NoAddressBlock,

    /// No line qualified as the company name
    #[error("company name not found")]
    MissingCompany,

    /// No line qualified as the street
    #[error("street not found")]
    MissingStreet,
}

impl ExtractionFailure {
    /// Stable reason code for logs and API payloads
    pub fn code(self) -> &'static str {
        match self {
            ExtractionFailure::NoShipToSection => "no_ship_to_section",
            ExtractionFailure::NoAddressBlock => "no_address_block",
            ExtractionFailure::MissingCompany => "missing_company",
            ExtractionFailure::MissingStreet => "missing_street",
        }
    }
}

/// Outcome of one extraction attempt
pub type ExtractionResult = Result<AddressDraft, ExtractionFailure>;

/// Reject drafts without both a company name and a street
pub fn require_core_fields(draft: AddressDraft) -> ExtractionResult {
    if draft.is_blank(AddressField::CompanyName) {
        return Err(ExtractionFailure::MissingCompany);
    }
    if draft.is_blank(AddressField::Street) {
        return Err(ExtractionFailure::MissingStreet);
    }
    Ok(draft)
}
