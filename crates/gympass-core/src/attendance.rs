//! Check-in policy.
//!
//! Whether a member may check in twice on the same day is a parameter of
//! [`AttendanceDesk::check_in`], not something the desk decides.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use gympass_shared::constants::SUBSCRIPTION_WARNING_DAYS;
use gympass_shared::{ClientId, ClientStatus, RecordId, SubscriptionState};
use gympass_store::{AttendanceEntry, Database, RecordStore, StoreError};

use crate::error::{GymError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckIn {
    Recorded { attendance_id: RecordId },
    /// Duplicates were not allowed and the member already has a record today.
    AlreadyCheckedIn,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
    pub count: u64,
}

/// What the front desk should be told about a member being let in: an
/// inactive or suspended account, a lapsed subscription, or one ending
/// within [`SUBSCRIPTION_WARNING_DAYS`].
pub fn membership_warning(subscription: SubscriptionState, client_status: ClientStatus) -> Option<String> {
    let mut notes = Vec::new();
    if client_status != ClientStatus::Active {
        notes.push(format!("client is {client_status}"));
    }
    match subscription {
        SubscriptionState::Active { .. } if !subscription.ends_within(SUBSCRIPTION_WARNING_DAYS) => {}
        SubscriptionState::Active { days_remaining } => {
            notes.push(format!("subscription ends in {days_remaining} day(s)"))
        }
        ended => notes.push(format!("subscription {ended}")),
    }
    (!notes.is_empty()).then(|| notes.join("; "))
}

pub struct AttendanceDesk<'a, S: RecordStore> {
    store: &'a S,
}

impl<'a, S: RecordStore> AttendanceDesk<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn check_in(&self, client_id: ClientId, allow_duplicate: bool) -> Result<CheckIn> {
        self.check_in_at(client_id, allow_duplicate, Local::now())
    }

    /// Check a member in at `at`. The attendance date is `at`'s local date.
    pub fn check_in_at(
        &self,
        client_id: ClientId,
        allow_duplicate: bool,
        at: DateTime<Local>,
    ) -> Result<CheckIn> {
        if self.store.find_client(client_id)?.is_none() {
            return Err(GymError::ClientNotFound(client_id));
        }

        let day = at.date_naive();
        if !allow_duplicate && self.store.has_attendance_on(client_id, day)? {
            debug!(client_id, %day, "Duplicate check-in refused");
            return Ok(CheckIn::AlreadyCheckedIn);
        }

        let attendance_id = self
            .store
            .insert_attendance(client_id, at.with_timezone(&Utc), day)?;
        info!(client_id, attendance_id, "Checked in");
        Ok(CheckIn::Recorded { attendance_id })
    }
}

impl AttendanceDesk<'_, Database> {
    /// Stamp the check-out time. Returns `false` if it was already stamped.
    pub fn check_out(&self, attendance_id: RecordId) -> Result<bool> {
        match self.store.get_attendance(attendance_id) {
            Ok(_) => {}
            Err(StoreError::NotFound) => {
                return Err(GymError::InvalidInput(format!(
                    "attendance record {attendance_id} not found"
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let stamped = self.store.check_out(attendance_id, Utc::now())?;
        if stamped {
            info!(attendance_id, "Checked out");
        }
        Ok(stamped)
    }

    pub fn daily_report(&self, date: NaiveDate) -> Result<DailyReport> {
        let entries = self.store.list_attendance_on(date)?;
        let count = self.store.count_attendance_on(date)?;
        Ok(DailyReport {
            date,
            entries,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::testing::{add_member, fixture};

    fn morning() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_check_in_records_present() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let desk = AttendanceDesk::new(&fx.db);

        let CheckIn::Recorded { attendance_id } = desk.check_in_at(id, false, morning()).unwrap()
        else {
            panic!("expected a recorded check-in");
        };

        let record = fx.db.get_attendance(attendance_id).unwrap();
        assert_eq!(record.client_id, id);
        assert_eq!(record.date, morning().date_naive());
        assert!(record.check_out_time.is_none());
    }

    #[test]
    fn test_duplicate_policy() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let desk = AttendanceDesk::new(&fx.db);
        let day = morning().date_naive();

        desk.check_in_at(id, false, morning()).unwrap();
        assert_eq!(
            desk.check_in_at(id, false, morning()).unwrap(),
            CheckIn::AlreadyCheckedIn
        );
        assert_eq!(fx.db.count_attendance_on(day).unwrap(), 1);

        assert!(matches!(
            desk.check_in_at(id, true, morning()).unwrap(),
            CheckIn::Recorded { .. }
        ));
        assert_eq!(fx.db.count_attendance_on(day).unwrap(), 2);
    }

    #[test]
    fn test_unknown_client() {
        let fx = fixture();
        let desk = AttendanceDesk::new(&fx.db);
        assert!(matches!(desk.check_in(404, true), Err(GymError::ClientNotFound(404))));
    }

    #[test]
    fn test_check_out_once() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let desk = AttendanceDesk::new(&fx.db);

        let CheckIn::Recorded { attendance_id } = desk.check_in(id, true).unwrap() else {
            panic!("expected a recorded check-in");
        };
        assert!(desk.check_out(attendance_id).unwrap());
        assert!(!desk.check_out(attendance_id).unwrap());
        assert!(matches!(desk.check_out(9999), Err(GymError::InvalidInput(_))));
    }

    #[test]
    fn test_daily_report() {
        let fx = fixture();
        let sam = add_member(&fx.db, "Sam Rivera");
        let ana = add_member(&fx.db, "Ana Costa");
        let desk = AttendanceDesk::new(&fx.db);

        desk.check_in_at(sam, true, morning()).unwrap();
        desk.check_in_at(ana, true, morning()).unwrap();

        let report = desk.daily_report(morning().date_naive()).unwrap();
        assert_eq!(report.count, 2);
        let mut names: Vec<_> = report.entries.iter().map(|e| e.client_name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Ana Costa", "Sam Rivera"]);

        let empty = desk
            .daily_report(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.entries.is_empty());
    }

    #[test]
    fn test_membership_warning() {
        let active = ClientStatus::Active;
        assert_eq!(
            membership_warning(SubscriptionState::Active { days_remaining: 30 }, active),
            None
        );
        assert_eq!(
            membership_warning(SubscriptionState::Active { days_remaining: 7 }, active).as_deref(),
            Some("subscription ends in 7 day(s)")
        );
        assert_eq!(
            membership_warning(SubscriptionState::EndsToday, active).as_deref(),
            Some("subscription ends today")
        );
        assert_eq!(
            membership_warning(SubscriptionState::Lapsed { days_overdue: 3 }, active).as_deref(),
            Some("subscription lapsed (3 days ago)")
        );
        assert_eq!(
            membership_warning(
                SubscriptionState::Lapsed { days_overdue: 1 },
                ClientStatus::Suspended
            )
            .as_deref(),
            Some("client is suspended; subscription lapsed (1 days ago)")
        );
    }
}
