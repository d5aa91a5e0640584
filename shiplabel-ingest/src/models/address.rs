//! Address records
//!
//! [`AddressDraft`] is what extraction and spreadsheet mapping produce: every
//! content field may be absent. [`AddressRecord`] is the normalized,
//! storable form. `id` and `created_at` are only ever set by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel stored in `email` when the address carries no email
pub const UNKNOWN_EMAIL: &str = "-";

/// Canonical address entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Store-assigned identifier, absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    /// Date of record (serialized `YYYY-MM-DD`), not the creation time
    pub date: NaiveDate,

    pub company_name: String,
    pub contact_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub mobile_number: String,

    /// `-` when unknown
    pub email: String,

    /// Store-assigned insertion timestamp, absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AddressRecord {
    /// Value of a single content field
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::CompanyName => &self.company_name,
            AddressField::ContactName => &self.contact_name,
            AddressField::Street => &self.street,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Country => &self.country,
            AddressField::ZipCode => &self.zip_code,
            AddressField::MobileNumber => &self.mobile_number,
            AddressField::Email => &self.email,
        }
    }

    /// Case-insensitive substring match over every displayed field
    ///
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let date = self.date.to_string();
        AddressField::ALL
            .iter()
            .map(|f| self.field(*f))
            .chain(std::iter::once(date.as_str()))
            .any(|value| value.to_lowercase().contains(&needle))
    }
}

/// Content fields shared by drafts and records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    CompanyName,
    ContactName,
    Street,
    City,
    State,
    Country,
    ZipCode,
    MobileNumber,
    Email,
}

impl AddressField {
    pub const ALL: [AddressField; 9] = [
        AddressField::CompanyName,
        AddressField::ContactName,
        AddressField::Street,
        AddressField::City,
        AddressField::State,
        AddressField::Country,
        AddressField::ZipCode,
        AddressField::MobileNumber,
        AddressField::Email,
    ];

    /// snake_case column / header name
    pub fn column(self) -> &'static str {
        match self {
            AddressField::CompanyName => "company_name",
            AddressField::ContactName => "contact_name",
            AddressField::Street => "street",
            AddressField::City => "city",
            AddressField::State => "state",
            AddressField::Country => "country",
            AddressField::ZipCode => "zip_code",
            AddressField::MobileNumber => "mobile_number",
            AddressField::Email => "email",
        }
    }

    /// Human-readable spreadsheet header
    pub fn label(self) -> &'static str {
        match self {
            AddressField::CompanyName => "Company Name",
            AddressField::ContactName => "Contact Name",
            AddressField::Street => "Street",
            AddressField::City => "City",
            AddressField::State => "State",
            AddressField::Country => "Country",
            AddressField::ZipCode => "Zip Code",
            AddressField::MobileNumber => "Mobile Number",
            AddressField::Email => "Email",
        }
    }
}

/// Pre-normalization address, fields possibly absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
}

impl AddressDraft {
    pub fn get(&self, field: AddressField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// True when `field` is absent or whitespace only
    pub fn is_blank(&self, field: AddressField) -> bool {
        self.get(field).map_or(true, |v| v.trim().is_empty())
    }

    /// True when every field is absent or whitespace only
    pub fn is_empty(&self) -> bool {
        AddressField::ALL.iter().all(|f| self.is_blank(*f))
    }

    fn slot(&self, field: AddressField) -> &Option<String> {
        match field {
            AddressField::CompanyName => &self.company_name,
            AddressField::ContactName => &self.contact_name,
            AddressField::Street => &self.street,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Country => &self.country,
            AddressField::ZipCode => &self.zip_code,
            AddressField::MobileNumber => &self.mobile_number,
            AddressField::Email => &self.email,
        }
    }

    fn slot_mut(&mut self, field: AddressField) -> &mut Option<String> {
        match field {
            AddressField::CompanyName => &mut self.company_name,
            AddressField::ContactName => &mut self.contact_name,
            AddressField::Street => &mut self.street,
            AddressField::City => &mut self.city,
            AddressField::State => &mut self.state,
            AddressField::Country => &mut self.country,
            AddressField::ZipCode => &mut self.zip_code,
            AddressField::MobileNumber => &mut self.mobile_number,
            AddressField::Email => &mut self.email,
        }
    }
}
