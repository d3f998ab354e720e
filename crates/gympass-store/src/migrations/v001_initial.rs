//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `clients`, `attendance` and `barcodes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Clients
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS clients (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT NOT NULL,
    phone              TEXT NOT NULL,
    email              TEXT NOT NULL DEFAULT '',
    subscription_type  TEXT NOT NULL,
    subscription_start TEXT NOT NULL,             -- YYYY-MM-DD
    subscription_end   TEXT NOT NULL,             -- YYYY-MM-DD
    status             TEXT NOT NULL DEFAULT 'active',
    created_at         TEXT NOT NULL              -- RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(name);

-- ----------------------------------------------------------------
-- Attendance
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS attendance (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id      INTEGER NOT NULL,              -- FK -> clients(id)
    check_in_time  TEXT NOT NULL,                 -- RFC-3339
    check_out_time TEXT,                          -- RFC-3339, nullable
    date           TEXT NOT NULL,                 -- local YYYY-MM-DD of check-in
    status         TEXT NOT NULL DEFAULT 'present',

    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);
CREATE INDEX IF NOT EXISTS idx_attendance_client ON attendance(client_id, date);

-- ----------------------------------------------------------------
-- Barcodes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS barcodes (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id    INTEGER NOT NULL,                -- FK -> clients(id)
    barcode_data TEXT NOT NULL UNIQUE,            -- badge token
    status       TEXT NOT NULL DEFAULT 'active',
    created_at   TEXT NOT NULL,                   -- RFC-3339
    updated_at   TEXT NOT NULL,                   -- RFC-3339

    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE INDEX IF NOT EXISTS idx_barcodes_client ON barcodes(client_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
