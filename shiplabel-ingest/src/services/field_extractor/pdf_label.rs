//! Shipping-label PDF extraction
//!
//! Works on the single string produced by the layout reconstructor. The
//! ship-to segment runs from `SHIP TO:` up to the carrier service line
//! (`UPS STANDARD`), a `BILLING` section, or the end of the text. Distinct
//! visual lines survive reconstruction only as runs of two or more spaces,
//! so those runs are the pseudo-line separators.

use once_cell::sync::Lazy;
use regex::Regex;
use shiplabel_common::config::PdfConfig;

use super::rules::{self, RuleSet};
use super::{require_core_fields, ExtractionFailure, ExtractionResult};
use crate::models::AddressField;

static SHIP_TO_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)SHIP\s+TO:(.*?)(?:UPS\s+STANDARD|BILLING|$)")
        .expect("ship-to pattern is valid")
});

static PSEUDO_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("line break pattern is valid"));

/// Extractor for the fixed-destination PDF label format
#[derive(Debug)]
pub struct PdfLabelExtractor {
    rules: RuleSet,
}

impl PdfLabelExtractor {
    pub fn new(config: &PdfConfig) -> Self {
        let destination = &config.destination;

        let rules = RuleSet::new(vec![
            rules::containing_any(
                "company_marker",
                AddressField::CompanyName,
                config.company_markers.clone(),
            ),
            rules::first_line(AddressField::ContactName),
            rules::containing_any(
                "street_marker",
                AddressField::Street,
                config.street_markers.clone(),
            ),
            rules::nine_digit_phone(AddressField::MobileNumber),
            rules::zip_from_zip_city(),
            rules::city_from_zip_city(),
            rules::constant("destination_zip", AddressField::ZipCode, destination.zip_code.clone()),
            rules::constant("destination_city", AddressField::City, destination.city.clone()),
            rules::constant("destination_state", AddressField::State, destination.state.clone()),
            rules::constant("destination_country", AddressField::Country, destination.country.clone()),
        ]);

        Self { rules }
    }

    /// Split the ship-to segment of `text` into pseudo-lines
    pub fn address_lines(text: &str) -> Result<Vec<String>, ExtractionFailure> {
        let segment = SHIP_TO_SEGMENT
            .captures(text)
            .and_then(|caps| caps.get(1))
            .ok_or(ExtractionFailure::NoShipToSection)?;

        let lines: Vec<String> = PSEUDO_LINE_BREAK
            .split(segment.as_str().trim())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        if lines.is_empty() {
            return Err(ExtractionFailure::NoAddressBlock);
        }
        Ok(lines)
    }

    /// Extract one address from reconstructed label text
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let result = Self::address_lines(text)
            .and_then(|lines| require_core_fields(self.rules.apply(&lines)));

        if let Err(failure) = &result {
            tracing::warn!(source = "pdf", reason = failure.code(), "Address extraction failed");
        }
        result
    }
}

impl Default for PdfLabelExtractor {
    fn default() -> Self {
        Self::new(&PdfConfig::default())
    }
}
