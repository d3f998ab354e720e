//! v002 -- At most one `active` barcode per client.
//!
//! Older databases may already hold several active rows for one client; all
//! but the newest are demoted to `inactive` before the index is created.

use rusqlite::Connection;

const UP_SQL: &str = r#"
UPDATE barcodes
   SET status = 'inactive'
 WHERE status = 'active'
   AND id NOT IN (
       SELECT MAX(id) FROM barcodes WHERE status = 'active' GROUP BY client_id
   );

CREATE UNIQUE INDEX IF NOT EXISTS idx_barcodes_one_active
    ON barcodes(client_id) WHERE status = 'active';
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
