//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the operator interface or written into a backup.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use gympass_shared::{
    AttendanceStatus, BarcodeStatus, ClientId, ClientStatus, RecordId, SubscriptionState,
    SubscriptionType,
};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A gym member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    /// May be empty.
    pub email: String,
    pub subscription_type: SubscriptionType,
    pub subscription_start: NaiveDate,
    pub subscription_end: NaiveDate,
    pub status: ClientStatus,
    /// When the client row was created.
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn subscription_state(&self, today: NaiveDate) -> SubscriptionState {
        SubscriptionState::on(self.subscription_end, today)
    }
}

/// Fields supplied when registering a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub subscription_type: SubscriptionType,
    pub subscription_start: NaiveDate,
    pub subscription_end: NaiveDate,
}

impl NewClient {
    /// Check the fields an operator must fill in.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("client name is required".to_string());
        }
        if self.phone.trim().is_empty() {
            return Err("phone number is required".to_string());
        }
        if self.subscription_end < self.subscription_start {
            return Err(format!(
                "subscription ends ({}) before it starts ({})",
                self.subscription_end, self.subscription_start
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

/// One check-in. Several per client per day are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub client_id: ClientId,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    /// Local calendar date of the check-in, stored for date-range queries.
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// An attendance row joined with the client's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub client_name: String,
}

// ---------------------------------------------------------------------------
// Barcode
// ---------------------------------------------------------------------------

/// A badge token issued to a client, with its lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarcodeRecord {
    pub id: RecordId,
    pub client_id: ClientId,
    /// Token text, unique across all records ever issued.
    pub token: String,
    pub status: BarcodeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A barcode row joined with the client's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarcodeListing {
    #[serde(flatten)]
    pub record: BarcodeRecord,
    pub client_name: String,
}
