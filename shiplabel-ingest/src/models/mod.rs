//! Data models for shiplabel-ingest
//!
//! - Address drafts and records
//! - Import sources and raw PDF tokens

pub mod address;
pub mod source;

pub use address::{AddressDraft, AddressField, AddressRecord, UNKNOWN_EMAIL};
pub use source::{ImportInput, PageTokens, RawToken, SourceKind};
