use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use gympass_shared::token::extract_client_id;
use gympass_shared::ClientId;

use crate::convert::{date, ts};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{AttendanceRecord, BarcodeRecord, Client};

/// Full backup payload, serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPayload {
    /// RFC 3339 timestamp of when the backup was created
    pub created_at: String,
    /// App version that produced the backup
    pub version: String,
    pub clients: Vec<Client>,
    pub barcodes: Vec<BarcodeRecord>,
    pub attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportStats {
    pub clients_imported: usize,
    /// Imported clients whose backup id was held by someone else.
    pub clients_remapped: usize,
    pub barcodes_imported: usize,
    pub attendance_imported: usize,
    /// Rows identical to one already in the database.
    pub already_present: usize,
    /// Rows dropped: no client to attach to, a token naming another client,
    /// a token owned by another client, or a second active barcode.
    pub skipped: usize,
}

impl Database {
    /// Export every client, barcode and attendance row.
    pub fn export_backup(&self) -> Result<BackupPayload> {
        Ok(BackupPayload {
            created_at: ts(&chrono::Utc::now()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            clients: self.list_clients()?,
            barcodes: self.list_all_barcodes()?,
            attendance: self.list_all_attendance()?,
        })
    }

    /// Merge a backup payload into this database.
    ///
    /// A backup client is matched to an existing row with the same name,
    /// phone and creation time (preferring the same id). Unmatched clients
    /// keep their id when it is free and get a new one otherwise.
    ///
    /// Barcode rows are only attached to their matched client, and only when
    /// the token still names that client; anything else is skipped, since a
    /// badge must resolve to the member it was printed for. Attendance rows
    /// follow their client. Rows already present are counted, not copied.
    pub fn import_backup(&self, payload: &BackupPayload) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let tx = self.conn().unchecked_transaction()?;

        // backup client id -> id in this database
        let mut client_ids: HashMap<ClientId, ClientId> = HashMap::new();

        for c in &payload.clients {
            if let Some(existing) = matching_client(&tx, c)? {
                stats.already_present += 1;
                client_ids.insert(c.id, existing);
                continue;
            }

            let id_taken = row_exists(&tx, "clients", c.id)?;
            insert_client(&tx, c, (!id_taken).then_some(c.id))?;
            let new_id = tx.last_insert_rowid();
            if id_taken {
                tracing::warn!(backup_id = c.id, new_id, name = %c.name, "client id taken, imported under a new id");
                stats.clients_remapped += 1;
            }
            stats.clients_imported += 1;
            client_ids.insert(c.id, new_id);
        }

        for b in &payload.barcodes {
            let Some(&client_id) = client_ids.get(&b.client_id) else {
                tracing::warn!(record_id = b.id, client_id = b.client_id, "barcode without its client skipped");
                stats.skipped += 1;
                continue;
            };

            if extract_client_id(&b.token).ok() != Some(client_id) {
                tracing::warn!(record_id = b.id, client_id, token = %b.token, "barcode token names another client, skipped");
                stats.skipped += 1;
                continue;
            }

            let owner: Option<ClientId> = tx
                .query_row(
                    "SELECT client_id FROM barcodes WHERE barcode_data = ?1",
                    params![b.token],
                    |row| row.get(0),
                )
                .optional()?;
            match owner {
                Some(owner) if owner == client_id => {
                    stats.already_present += 1;
                    continue;
                }
                Some(_) => {
                    stats.skipped += 1;
                    continue;
                }
                None => {}
            }

            let id = (!row_exists(&tx, "barcodes", b.id)?).then_some(b.id);
            let res = tx.execute(
                "INSERT INTO barcodes (id, client_id, barcode_data, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    client_id,
                    b.token,
                    b.status.as_str(),
                    ts(&b.created_at),
                    ts(&b.updated_at),
                ],
            );
            tally(res, &mut stats.barcodes_imported, &mut stats.skipped)?;
        }

        for a in &payload.attendance {
            let Some(&client_id) = client_ids.get(&a.client_id) else {
                tracing::warn!(attendance_id = a.id, client_id = a.client_id, "attendance without its client skipped");
                stats.skipped += 1;
                continue;
            };

            let present: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM attendance WHERE client_id = ?1 AND check_in_time = ?2)",
                params![client_id, ts(&a.check_in_time)],
                |row| row.get(0),
            )?;
            if present {
                stats.already_present += 1;
                continue;
            }

            let id = (!row_exists(&tx, "attendance", a.id)?).then_some(a.id);
            let res = tx.execute(
                "INSERT INTO attendance (id, client_id, check_in_time, check_out_time, date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    client_id,
                    ts(&a.check_in_time),
                    a.check_out_time.as_ref().map(ts),
                    date(&a.date),
                    a.status.as_str(),
                ],
            );
            tally(res, &mut stats.attendance_imported, &mut stats.skipped)?;
        }

        tx.commit()?;
        tracing::info!(?stats, "backup imported");
        Ok(stats)
    }
}

fn matching_client(conn: &Connection, c: &Client) -> Result<Option<ClientId>> {
    Ok(conn
        .query_row(
            "SELECT id FROM clients
              WHERE name = ?1 AND phone = ?2 AND created_at = ?3
              ORDER BY (id = ?4) DESC, id ASC
              LIMIT 1",
            params![c.name, c.phone, ts(&c.created_at), c.id],
            |row| row.get(0),
        )
        .optional()?)
}

// `table` is always a literal from this module.
fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    Ok(conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        params![id],
        |row| row.get(0),
    )?)
}

/// `id: None` lets SQLite pick a fresh rowid.
fn insert_client(conn: &Connection, c: &Client, id: Option<ClientId>) -> Result<()> {
    conn.execute(
        "INSERT INTO clients (id, name, phone, email, subscription_type,
             subscription_start, subscription_end, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            c.name,
            c.phone,
            c.email,
            c.subscription_type.as_str(),
            date(&c.subscription_start),
            date(&c.subscription_end),
            c.status.as_str(),
            ts(&c.created_at),
        ],
    )?;
    Ok(())
}

/// Constraint failures (duplicate token, second active badge) skip the row;
/// anything else aborts the import.
fn tally(res: rusqlite::Result<usize>, imported: &mut usize, skipped: &mut usize) -> Result<()> {
    match res.map_err(StoreError::from) {
        Ok(_) => *imported += 1,
        Err(StoreError::Constraint(msg)) => {
            tracing::warn!(reason = %msg, "backup row skipped");
            *skipped += 1;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
