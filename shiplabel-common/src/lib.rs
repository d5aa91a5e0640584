//! # shiplabel common library
//!
//! Shared code for the shiplabel crates:
//! - Error and result types
//! - Bootstrap configuration (TOML) and root folder resolution
//! - Label event bus used for user-facing notifications
//! - SQLite pool initialisation and the settings table
//! - Time helpers

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
