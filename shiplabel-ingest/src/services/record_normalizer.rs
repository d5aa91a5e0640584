//! Draft → storable record
//!
//! Normalization never fails: absent fields become empty strings, every
//! value is trimmed, and a missing email becomes [`UNKNOWN_EMAIL`].

use chrono::NaiveDate;

use crate::decoders::SpreadsheetRow;
use crate::models::{AddressDraft, AddressField, AddressRecord, UNKNOWN_EMAIL};

/// Produce a storable record dated `today`
///
/// `id` and `created_at` stay unset; the store assigns them.
pub fn normalize(draft: &AddressDraft, today: NaiveDate) -> AddressRecord {
    let text = |field: AddressField| -> String {
        draft.get(field).map(str::trim).unwrap_or_default().to_string()
    };

    let email = match text(AddressField::Email) {
        e if e.is_empty() => UNKNOWN_EMAIL.to_string(),
        e => e,
    };

    AddressRecord {
        id: None,
        date: today,
        company_name: text(AddressField::CompanyName),
        contact_name: text(AddressField::ContactName),
        street: text(AddressField::Street),
        city: text(AddressField::City),
        state: text(AddressField::State),
        country: text(AddressField::Country),
        zip_code: text(AddressField::ZipCode),
        mobile_number: text(AddressField::MobileNumber),
        email,
        created_at: None,
    }
}

/// Normalize a whole batch
pub fn normalize_all(drafts: &[AddressDraft], today: NaiveDate) -> Vec<AddressRecord> {
    drafts.iter().map(|d| normalize(d, today)).collect()
}

/// `Zip-Code `, `zip code`, `ZIP_CODE` → `zip_code`
fn header_key(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Map one spreadsheet row onto a draft
///
/// Each field accepts its human-readable header, its snake_case column name,
/// or any header normalizing to the same key, in that priority order. Empty
/// cells never win. Returns `None` for rows without any value.
pub fn draft_from_row(row: &SpreadsheetRow) -> Option<AddressDraft> {
    let mut draft = AddressDraft::default();

    for field in AddressField::ALL {
        let mut best: Option<(u8, &str)> = None;

        for (header, value) in row {
            if value.trim().is_empty() {
                continue;
            }
            let rank = if header == field.label() {
                0
            } else if header == field.column() {
                1
            } else if header_key(header) == field.column() {
                2
            } else {
                continue;
            };
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((rank, value.as_str()));
            }
        }

        if let Some((_, value)) = best {
            draft.set(field, value);
        }
    }

    if draft.is_empty() {
        None
    } else {
        Some(draft)
    }
}

/// Map every non-blank row
pub fn drafts_from_rows(rows: &[SpreadsheetRow]) -> Vec<AddressDraft> {
    let drafts: Vec<AddressDraft> = rows.iter().filter_map(draft_from_row).collect();

    if drafts.len() < rows.len() {
        tracing::debug!(
            rows = rows.len(),
            skipped = rows.len() - drafts.len(),
            "Skipped blank spreadsheet rows"
        );
    }
    drafts
}
