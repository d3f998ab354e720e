//! CRUD and lifecycle writes for [`BarcodeRecord`]s.
//!
//! Barcode rows are never deleted; they only change status. The partial
//! unique index from migration v002 keeps at most one `active` row per
//! client, so every write that activates a row demotes or retires the
//! previous one inside the same transaction.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use gympass_shared::constants::BARCODE_SEARCH_MIN_LEN;
use gympass_shared::{BarcodeStatus, ClientId, RecordId};

use crate::convert::{contains_pattern, parse_enum, parse_ts, ts};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{BarcodeListing, BarcodeRecord};

const BARCODE_COLUMNS: &str = "b.id, b.client_id, b.barcode_data, b.status, b.created_at, b.updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new `active` barcode for `client_id`.
    ///
    /// Fails with [`StoreError::Constraint`] if the token already exists or
    /// the client already holds an active barcode.
    pub fn create_barcode(&self, client_id: ClientId, token: &str) -> Result<RecordId> {
        insert_active(self.conn(), client_id, token)?;
        let id = self.conn().last_insert_rowid();
        tracing::debug!(record_id = id, client_id, "barcode record created");
        Ok(id)
    }

    /// Retire an existing record and insert a fresh active one atomically.
    ///
    /// `retire` names the record to retire and the status it moves to. The
    /// record must belong to `client_id`.
    pub fn replace_barcode(
        &self,
        retire: Option<(RecordId, BarcodeStatus)>,
        client_id: ClientId,
        token: &str,
    ) -> Result<RecordId> {
        let tx = self.conn().unchecked_transaction()?;

        if let Some((old_id, status)) = retire {
            let affected = tx.execute(
                "UPDATE barcodes SET status = ?1, updated_at = ?2
                  WHERE id = ?3 AND client_id = ?4",
                params![status.as_str(), ts(&Utc::now()), old_id, client_id],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound);
            }
        }

        insert_active(&tx, client_id, token)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(record_id = id, client_id, retired = ?retire, "barcode record replaced");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Set the status of a record and bump `updated_at`.
    pub fn update_barcode_status(&self, id: RecordId, status: BarcodeStatus) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE barcodes SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), ts(&Utc::now()), id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Activate a record, demoting any other active record of the same client
    /// to `inactive` first.  Returns how many records were demoted.
    pub fn activate_barcode_exclusive(&self, id: RecordId) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        let now = ts(&Utc::now());

        let client_id: ClientId = tx.query_row(
            "SELECT client_id FROM barcodes WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        let demoted = tx.execute(
            "UPDATE barcodes SET status = ?1, updated_at = ?2
              WHERE client_id = ?3 AND status = ?4 AND id != ?5",
            params![
                BarcodeStatus::Inactive.as_str(),
                now,
                client_id,
                BarcodeStatus::Active.as_str(),
                id
            ],
        )?;

        tx.execute(
            "UPDATE barcodes SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![BarcodeStatus::Active.as_str(), now, id],
        )?;
        tx.commit()?;

        Ok(demoted)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_barcode(&self, id: RecordId) -> Result<BarcodeRecord> {
        Ok(self.conn().query_row(
            &format!("SELECT {BARCODE_COLUMNS} FROM barcodes b WHERE b.id = ?1"),
            params![id],
            row_to_barcode,
        )?)
    }

    pub fn find_barcode_by_token(&self, token: &str) -> Result<Option<BarcodeRecord>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {BARCODE_COLUMNS} FROM barcodes b WHERE b.barcode_data = ?1"),
                params![token],
                row_to_barcode,
            )
            .optional()?)
    }

    /// The client's current record: the active one if any, otherwise the most
    /// recently updated (highest id on ties).
    pub fn find_barcode_by_client(&self, client_id: ClientId) -> Result<Option<BarcodeRecord>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {BARCODE_COLUMNS} FROM barcodes b
                      WHERE b.client_id = ?1
                      ORDER BY (b.status = 'active') DESC, b.updated_at DESC, b.id DESC
                      LIMIT 1"
                ),
                params![client_id],
                row_to_barcode,
            )
            .optional()?)
    }

    /// Every record ever issued to a client, newest first.
    pub fn list_barcodes_for_client(&self, client_id: ClientId) -> Result<Vec<BarcodeRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BARCODE_COLUMNS} FROM barcodes b
              WHERE b.client_id = ?1
              ORDER BY b.created_at DESC, b.id DESC"
        ))?;
        let rows = stmt.query_map(params![client_id], row_to_barcode)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// All records with client names, newest first, optionally filtered by
    /// status.
    pub fn list_barcodes(&self, status: Option<BarcodeStatus>) -> Result<Vec<BarcodeListing>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BARCODE_COLUMNS}, c.name FROM barcodes b
              JOIN clients c ON b.client_id = c.id
              WHERE ?1 IS NULL OR b.status = ?1
              ORDER BY b.created_at DESC, b.id DESC"
        ))?;
        let rows = stmt.query_map(params![status.map(|s| s.as_str())], row_to_listing)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    /// Case-insensitive substring search over tokens.  Queries shorter than
    /// three characters return nothing.
    pub fn search_barcodes(&self, query: &str) -> Result<Vec<BarcodeListing>> {
        let query = query.trim();
        if query.chars().count() < BARCODE_SEARCH_MIN_LEN {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BARCODE_COLUMNS}, c.name FROM barcodes b
              JOIN clients c ON b.client_id = c.id
              WHERE b.barcode_data LIKE ?1 ESCAPE '\\'
              ORDER BY b.created_at DESC, b.id DESC"
        ))?;
        let rows = stmt.query_map(params![contains_pattern(query)], row_to_listing)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    pub(crate) fn list_all_barcodes(&self) -> Result<Vec<BarcodeRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BARCODE_COLUMNS} FROM barcodes b ORDER BY b.id ASC"
        ))?;
        let rows = stmt.query_map([], row_to_barcode)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_active(conn: &rusqlite::Connection, client_id: ClientId, token: &str) -> Result<()> {
    let now = ts(&Utc::now());
    conn.execute(
        "INSERT INTO barcodes (client_id, barcode_data, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![client_id, token, BarcodeStatus::Active.as_str(), now],
    )?;
    Ok(())
}

fn row_to_barcode(row: &rusqlite::Row<'_>) -> rusqlite::Result<BarcodeRecord> {
    let status: String = row.get(3)?;
    let created: String = row.get(4)?;
    let updated: String = row.get(5)?;

    Ok(BarcodeRecord {
        id: row.get(0)?,
        client_id: row.get(1)?,
        token: row.get(2)?,
        status: parse_enum(3, &status)?,
        created_at: parse_ts(4, &created)?,
        updated_at: parse_ts(5, &updated)?,
    })
}

fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<BarcodeListing> {
    Ok(BarcodeListing {
        record: row_to_barcode(row)?,
        client_name: row.get(6)?,
    })
}
