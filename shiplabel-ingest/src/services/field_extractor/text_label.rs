//! Pasted label text extraction

use super::rules::{self, RuleSet};
use super::{require_core_fields, ExtractionFailure, ExtractionResult, SHIP_TO_MARKER};
use crate::models::AddressField;
use crate::services::line_splitter::split_lines;

/// Extractor for free-form pasted label text
#[derive(Debug)]
pub struct TextLabelExtractor {
    rules: RuleSet,
}

impl TextLabelExtractor {
    pub fn new() -> Self {
        let rules = RuleSet::new(vec![
            rules::digit_only_phone(AddressField::MobileNumber),
            rules::line_after_phone(AddressField::CompanyName),
            rules::street_like(AddressField::Street),
            rules::zip_from_zip_city(),
            rules::city_from_zip_city(),
            rules::last_line(AddressField::Country),
            rules::first_line(AddressField::ContactName),
        ]);

        Self { rules }
    }

    /// Lines strictly after the first line containing the ship-to marker
    pub fn address_lines(text: &str) -> Result<Vec<String>, ExtractionFailure> {
        let mut lines = split_lines(text);

        let anchor = lines
            .iter()
            .position(|line| line.to_uppercase().contains(SHIP_TO_MARKER))
            .ok_or(ExtractionFailure::NoShipToSection)?;

        let block = lines.split_off(anchor + 1);
        if block.is_empty() {
            return Err(ExtractionFailure::NoAddressBlock);
        }
        Ok(block)
    }

    /// Extract one address from pasted text
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let result = Self::address_lines(text)
            .and_then(|lines| require_core_fields(self.rules.apply(&lines)));

        if let Err(failure) = &result {
            tracing::warn!(source = "text", reason = failure.code(), "Address extraction failed");
        }
        result
    }
}

impl Default for TextLabelExtractor {
    fn default() -> Self {
        Self::new()
    }
}
