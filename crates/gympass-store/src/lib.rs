//! # gympass-store
//!
//! Local SQLite storage for gympass.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for clients,
//! attendance and barcode records, plus the [`RecordStore`] trait through
//! which the service layer reaches the barcode and attendance tables.

pub mod attendance;
pub mod backup;
pub mod barcodes;
pub mod clients;
pub mod database;
pub mod migrations;
pub mod models;
pub mod records;

mod convert;
mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use records::RecordStore;
