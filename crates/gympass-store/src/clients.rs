//! CRUD operations for [`Client`] records.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use gympass_shared::constants::CLIENT_SEARCH_MIN_LEN;
use gympass_shared::{ClientId, ClientStatus};

use crate::convert::{contains_pattern, date, parse_date, parse_enum, parse_ts, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{Client, NewClient};

const CLIENT_COLUMNS: &str = "id, name, phone, email, subscription_type, subscription_start, \
                              subscription_end, status, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new client with status `active` and return its id.
    pub fn add_client(&self, client: &NewClient) -> Result<ClientId> {
        self.conn().execute(
            "INSERT INTO clients (name, phone, email, subscription_type, subscription_start,
                                  subscription_end, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                client.name.trim(),
                client.phone.trim(),
                client.email.trim(),
                client.subscription_type.as_str(),
                date(&client.subscription_start),
                date(&client.subscription_end),
                ClientStatus::Active.as_str(),
                ts(&Utc::now()),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single client by id.
    pub fn get_client(&self, id: ClientId) -> Result<Client> {
        Ok(self.conn().query_row(
            &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
            params![id],
            row_to_client,
        )?)
    }

    pub fn find_client(&self, id: ClientId) -> Result<Option<Client>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
                params![id],
                row_to_client,
            )
            .optional()?)
    }

    /// List all clients ordered by name.
    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name ASC, id ASC"))?;
        let rows = stmt.query_map([], row_to_client)?;

        let mut clients = Vec::new();
        for row in rows {
            clients.push(row?);
        }
        Ok(clients)
    }

    /// Case-insensitive substring search over name, phone and email.
    ///
    /// Queries shorter than two characters return nothing.
    pub fn search_clients(&self, query: &str) -> Result<Vec<Client>> {
        let query = query.trim();
        if query.chars().count() < CLIENT_SEARCH_MIN_LEN {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients
             WHERE name LIKE ?1 ESCAPE '\\'
                OR phone LIKE ?1 ESCAPE '\\'
                OR email LIKE ?1 ESCAPE '\\'
             ORDER BY name ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![contains_pattern(query)], row_to_client)?;

        let mut clients = Vec::new();
        for row in rows {
            clients.push(row?);
        }
        Ok(clients)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Overwrite every editable field of `client`.  Returns `true` if a row
    /// was updated.
    pub fn update_client(&self, client: &Client) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE clients
                SET name = ?1, phone = ?2, email = ?3, subscription_type = ?4,
                    subscription_start = ?5, subscription_end = ?6, status = ?7
              WHERE id = ?8",
            params![
                client.name.trim(),
                client.phone.trim(),
                client.email.trim(),
                client.subscription_type.as_str(),
                date(&client.subscription_start),
                date(&client.subscription_end),
                client.status.as_str(),
                client.id,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn set_client_status(&self, id: ClientId, status: ClientStatus) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE clients SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a client.  Returns `true` if a row was deleted.
    ///
    /// Fails with [`StoreError::Constraint`] while attendance or barcode rows
    /// still reference the client.
    ///
    /// [`StoreError::Constraint`]: crate::StoreError::Constraint
    pub fn delete_client(&self, id: ClientId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM clients WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn row_to_client(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    let subscription_type: String = row.get(4)?;
    let start: String = row.get(5)?;
    let end: String = row.get(6)?;
    let status: String = row.get(7)?;
    let created: String = row.get(8)?;

    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        subscription_type: parse_enum(4, &subscription_type)?,
        subscription_start: parse_date(5, &start)?,
        subscription_end: parse_date(6, &end)?,
        status: parse_enum(7, &status)?,
        created_at: parse_ts(8, &created)?,
    })
}
