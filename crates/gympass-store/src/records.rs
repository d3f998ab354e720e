//! The record-store seam consumed by the service layer.
//!
//! Services hold a `&S where S: RecordStore` instead of reaching for a global
//! connection, so tests can hand them a double that fails on demand.

use chrono::{DateTime, NaiveDate, Utc};

use gympass_shared::{BarcodeStatus, ClientId, RecordId};

use crate::database::Database;
use crate::error::Result;
use crate::models::{BarcodeRecord, Client};

pub trait RecordStore {
    /// Insert an `active` barcode record.
    fn create_barcode(&self, client_id: ClientId, token: &str) -> Result<RecordId>;

    /// Set a record's status and bump its `updated_at`.
    fn update_barcode_status(&self, record_id: RecordId, status: BarcodeStatus) -> Result<()>;

    /// The client's current record, if any.
    fn find_barcode_by_client(&self, client_id: ClientId) -> Result<Option<BarcodeRecord>>;

    fn get_barcode(&self, record_id: RecordId) -> Result<BarcodeRecord>;

    /// Retire `retire` (if given) and insert a new active record, atomically.
    fn replace_barcode(
        &self,
        retire: Option<(RecordId, BarcodeStatus)>,
        client_id: ClientId,
        token: &str,
    ) -> Result<RecordId>;

    /// Activate a record, demoting the client's other active record.
    fn activate_barcode_exclusive(&self, record_id: RecordId) -> Result<usize>;

    fn find_client(&self, client_id: ClientId) -> Result<Option<Client>>;

    fn has_attendance_on(&self, client_id: ClientId, on: NaiveDate) -> Result<bool>;

    fn insert_attendance(
        &self,
        client_id: ClientId,
        at: DateTime<Utc>,
        on: NaiveDate,
    ) -> Result<RecordId>;
}

impl RecordStore for Database {
    fn create_barcode(&self, client_id: ClientId, token: &str) -> Result<RecordId> {
        Database::create_barcode(self, client_id, token)
    }

    fn update_barcode_status(&self, record_id: RecordId, status: BarcodeStatus) -> Result<()> {
        Database::update_barcode_status(self, record_id, status)
    }

    fn find_barcode_by_client(&self, client_id: ClientId) -> Result<Option<BarcodeRecord>> {
        Database::find_barcode_by_client(self, client_id)
    }

    fn get_barcode(&self, record_id: RecordId) -> Result<BarcodeRecord> {
        Database::get_barcode(self, record_id)
    }

    fn replace_barcode(
        &self,
        retire: Option<(RecordId, BarcodeStatus)>,
        client_id: ClientId,
        token: &str,
    ) -> Result<RecordId> {
        Database::replace_barcode(self, retire, client_id, token)
    }

    fn activate_barcode_exclusive(&self, record_id: RecordId) -> Result<usize> {
        Database::activate_barcode_exclusive(self, record_id)
    }

    fn find_client(&self, client_id: ClientId) -> Result<Option<Client>> {
        Database::find_client(self, client_id)
    }

    fn has_attendance_on(&self, client_id: ClientId, on: NaiveDate) -> Result<bool> {
        Database::has_attendance_on(self, client_id, on)
    }

    fn insert_attendance(
        &self,
        client_id: ClientId,
        at: DateTime<Utc>,
        on: NaiveDate,
    ) -> Result<RecordId> {
        Database::insert_attendance(self, client_id, at, on)
    }
}
