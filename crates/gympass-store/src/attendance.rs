use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use gympass_shared::{AttendanceStatus, ClientId, RecordId};

use crate::convert::{date, parse_date, parse_enum, parse_ts, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{AttendanceEntry, AttendanceRecord};

const ATTENDANCE_COLUMNS: &str =
    "a.id, a.client_id, a.check_in_time, a.check_out_time, a.date, a.status";

impl Database {
    /// Record a `present` check-in and return its id.
    pub fn insert_attendance(
        &self,
        client_id: ClientId,
        at: DateTime<Utc>,
        on: NaiveDate,
    ) -> Result<RecordId> {
        self.conn().execute(
            "INSERT INTO attendance (client_id, check_in_time, date, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![client_id, ts(&at), date(&on), AttendanceStatus::Present.as_str()],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn has_attendance_on(&self, client_id: ClientId, on: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM attendance WHERE client_id = ?1 AND date = ?2",
            params![client_id, date(&on)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // only the first check-out sticks
    pub fn check_out(&self, id: RecordId, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE attendance SET check_out_time = ?1 WHERE id = ?2 AND check_out_time IS NULL",
            params![ts(&at), id],
        )?;
        Ok(affected > 0)
    }

    pub fn get_attendance(&self, id: RecordId) -> Result<AttendanceRecord> {
        Ok(self.conn().query_row(
            &format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance a WHERE a.id = ?1"),
            params![id],
            row_to_attendance,
        )?)
    }

    /// Attendance history for a client, newest first.
    pub fn list_attendance_for_client(&self, client_id: ClientId) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a
             WHERE a.client_id = ?1
             ORDER BY a.check_in_time DESC, a.id DESC"
        ))?;
        let rows = stmt.query_map(params![client_id], row_to_attendance)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Everyone who checked in on `on`, newest first, with client names.
    pub fn list_attendance_on(&self, on: NaiveDate) -> Result<Vec<AttendanceEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ATTENDANCE_COLUMNS}, c.name FROM attendance a
             JOIN clients c ON a.client_id = c.id
             WHERE a.date = ?1
             ORDER BY a.check_in_time DESC, a.id DESC"
        ))?;
        let rows = stmt.query_map(params![date(&on)], |row| {
            Ok(AttendanceEntry {
                record: row_to_attendance(row)?,
                client_name: row.get(6)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn count_attendance_on(&self, on: NaiveDate) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM attendance WHERE date = ?1",
            params![date(&on)],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    pub(crate) fn list_all_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a ORDER BY a.id ASC"
        ))?;
        let rows = stmt.query_map([], row_to_attendance)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn row_to_attendance(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    let check_in: String = row.get(2)?;
    let check_out: Option<String> = row.get(3)?;
    let day: String = row.get(4)?;
    let status: String = row.get(5)?;

    Ok(AttendanceRecord {
        id: row.get(0)?,
        client_id: row.get(1)?,
        check_in_time: parse_ts(2, &check_in)?,
        check_out_time: check_out.as_deref().map(|s| parse_ts(3, s)).transpose()?,
        date: parse_date(4, &day)?,
        status: parse_enum(5, &status)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{member, test_db};
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_check_in_and_lookup() {
        let (db, _dir) = test_db();
        let id = db.add_client(&member("Hana", "1")).unwrap();
        let now = Utc::now();

        assert!(!db.has_attendance_on(id, day(19)).unwrap());
        let rec = db.insert_attendance(id, now, day(19)).unwrap();
        assert!(db.has_attendance_on(id, day(19)).unwrap());
        assert!(!db.has_attendance_on(id, day(20)).unwrap());

        let stored = db.get_attendance(rec).unwrap();
        assert_eq!(stored.client_id, id);
        assert_eq!(stored.date, day(19));
        assert_eq!(stored.status, AttendanceStatus::Present);
        assert!(stored.check_out_time.is_none());
    }

    #[test]
    fn test_duplicates_same_day_are_stored() {
        let (db, _dir) = test_db();
        let id = db.add_client(&member("Hana", "1")).unwrap();
        let now = Utc::now();

        db.insert_attendance(id, now, day(19)).unwrap();
        db.insert_attendance(id, now + Duration::hours(3), day(19)).unwrap();

        let history = db.list_attendance_for_client(id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].check_in_time > history[1].check_in_time);
        assert_eq!(db.count_attendance_on(day(19)).unwrap(), 2);
    }

    #[test]
    fn test_list_on_date_joins_names() {
        let (db, _dir) = test_db();
        let a = db.add_client(&member("Ali", "1")).unwrap();
        let b = db.add_client(&member("Bea", "2")).unwrap();
        let now = Utc::now();

        db.insert_attendance(a, now, day(18)).unwrap();
        db.insert_attendance(b, now, day(19)).unwrap();

        let entries = db.list_attendance_on(day(19)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].client_name, "Bea");
        assert_eq!(entries[0].record.client_id, b);
    }

    #[test]
    fn test_check_out_once() {
        let (db, _dir) = test_db();
        let id = db.add_client(&member("Hana", "1")).unwrap();
        let now = Utc::now();
        let rec = db.insert_attendance(id, now, day(19)).unwrap();

        assert!(db.check_out(rec, now + Duration::hours(1)).unwrap());
        assert!(!db.check_out(rec, now + Duration::hours(2)).unwrap());

        let stored = db.get_attendance(rec).unwrap();
        let out = stored.check_out_time.unwrap();
        assert!(out > stored.check_in_time);
        assert!(out < now + Duration::minutes(90));
    }

    #[test]
    fn test_unknown_client_rejected() {
        let (db, _dir) = test_db();
        let err = db.insert_attendance(404, Utc::now(), day(19)).unwrap_err();
        assert!(err.is_constraint());
    }
}
