use chrono::{Local, NaiveDate};
use serde::Serialize;

use gympass_shared::{ClientId, ClientStatus, RecordId, SubscriptionState};
use gympass_store::AttendanceRecord;

use super::{CommandResult, Reply};
use crate::attendance::{membership_warning, CheckIn, DailyReport};
use crate::state::Gym;

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReply {
    #[serde(flatten)]
    pub check_in: CheckIn,
    pub subscription: SubscriptionState,
    pub client_status: ClientStatus,
}

/// Manual check-in. `allow_duplicate` overrides the configured policy.
///
/// Lapsed subscriptions and inactive accounts are still checked in; the
/// reply message carries the warning.
pub fn check_in(
    gym: &Gym,
    client_id: ClientId,
    allow_duplicate: Option<bool>,
) -> CommandResult<CheckInReply> {
    let allow = allow_duplicate.unwrap_or(gym.config().allow_duplicate_checkin);
    let result = gym
        .desk()
        .check_in(client_id, allow)
        .map_err(|e| format!("Check-in failed: {e}"))?;
    let client = gym
        .db()
        .get_client(client_id)
        .map_err(|e| format!("Failed to load client {client_id}: {e}"))?;

    let reply = CheckInReply {
        check_in: result,
        subscription: client.subscription_state(Local::now().date_naive()),
        client_status: client.status,
    };

    let mut message = match result {
        CheckIn::Recorded { attendance_id } => {
            format!("{} checked in (attendance {attendance_id})", client.name)
        }
        CheckIn::AlreadyCheckedIn => format!("{} already checked in today", client.name),
    };
    if let Some(warning) = membership_warning(reply.subscription, reply.client_status) {
        message.push_str(&format!(". Warning: {warning}"));
    }
    Ok(Reply::new(message, reply))
}

pub fn check_out(gym: &Gym, attendance_id: RecordId) -> CommandResult<bool> {
    let stamped = gym
        .desk()
        .check_out(attendance_id)
        .map_err(|e| format!("Check-out failed: {e}"))?;
    let message = if stamped {
        format!("Attendance {attendance_id} checked out")
    } else {
        format!("Attendance {attendance_id} was already checked out")
    };
    Ok(Reply::new(message, stamped))
}

/// Attendance for `date`, today when `None`.
pub fn daily_report(gym: &Gym, date: Option<NaiveDate>) -> CommandResult<DailyReport> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let report = gym
        .desk()
        .daily_report(date)
        .map_err(|e| format!("Failed to build report: {e}"))?;
    Ok(Reply::new(
        format!("{} check-in(s) on {date}", report.count),
        report,
    ))
}

pub fn client_attendance(gym: &Gym, client_id: ClientId) -> CommandResult<Vec<AttendanceRecord>> {
    let records = gym
        .db()
        .list_attendance_for_client(client_id)
        .map_err(|e| format!("Failed to load attendance: {e}"))?;
    Ok(Reply::new(
        format!("{} visit(s) for client {client_id}", records.len()),
        records,
    ))
}
