//! Resolving scanner input.
//!
//! A scan is plain text, whatever device produced it. The validator checks
//! its shape, pulls out the client id, compares the text with the client's
//! current record and checks the member in when the badge is active.
//!
//! The status read and the attendance write are separate statements; a
//! badge deactivated between them still lets that one scan through.

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use gympass_shared::token::{extract_client_id, is_well_formed};
use gympass_shared::{BarcodeStatus, ClientId, ClientStatus, RecordId, SubscriptionState, TokenError};
use gympass_store::RecordStore;

use crate::attendance::{membership_warning, AttendanceDesk, CheckIn};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Too short or wrong prefix.
    Invalid,
    /// Right prefix, corrupt client id segment.
    MalformedToken { reason: String },
    /// The client has no barcode record.
    Unknown { client_id: ClientId },
    /// The client's current record carries a different token.
    Mismatched { client_id: ClientId },
    Rejected {
        client_id: ClientId,
        client_name: String,
        status: BarcodeStatus,
    },
    /// Admitted. A lapsed subscription or an inactive account does not block
    /// entry; it only shows up in [`message`](ScanOutcome::message).
    Accepted {
        client_id: ClientId,
        barcode_id: RecordId,
        client_name: String,
        subscription: SubscriptionState,
        client_status: ClientStatus,
        check_in: CheckIn,
    },
}

impl ScanOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanOutcome::Accepted { .. })
    }

    /// Text shown to the operator.
    pub fn message(&self) -> String {
        match self {
            ScanOutcome::Invalid => "Invalid barcode".to_string(),
            ScanOutcome::MalformedToken { reason } => format!("Malformed barcode: {reason}"),
            ScanOutcome::Unknown { client_id } => {
                format!("No barcode on file for client {client_id}")
            }
            ScanOutcome::Mismatched { client_id } => {
                format!("Barcode does not match the one on file for client {client_id}")
            }
            ScanOutcome::Rejected {
                client_id,
                client_name,
                status,
            } => format!("Barcode for {client_name} (client {client_id}) is {status}"),
            ScanOutcome::Accepted {
                client_name,
                subscription,
                client_status,
                check_in,
                ..
            } => {
                let greeting = match check_in {
                    CheckIn::Recorded { .. } => format!("Welcome, {client_name}! Checked in."),
                    CheckIn::AlreadyCheckedIn => format!("{client_name} already checked in today."),
                };
                match membership_warning(*subscription, *client_status) {
                    Some(warning) => format!("{greeting} Warning: {warning}"),
                    None => greeting,
                }
            }
        }
    }
}

pub struct ScanValidator<'a, S: RecordStore> {
    store: &'a S,
    allow_duplicate_checkin: bool,
}

impl<'a, S: RecordStore> ScanValidator<'a, S> {
    pub fn new(store: &'a S, allow_duplicate_checkin: bool) -> Self {
        Self {
            store,
            allow_duplicate_checkin,
        }
    }

    /// Classify `raw` and, if the badge is active, check the member in.
    ///
    /// Store failures are errors; every classification is `Ok`.
    pub fn validate_and_resolve(&self, raw: &str) -> Result<ScanOutcome> {
        let outcome = self.resolve(raw.trim())?;
        if outcome.is_accepted() {
            info!(outcome = ?outcome, "Scan accepted");
        } else {
            warn!(outcome = ?outcome, "Scan refused");
        }
        Ok(outcome)
    }

    fn resolve(&self, raw: &str) -> Result<ScanOutcome> {
        if !is_well_formed(raw) {
            return Ok(ScanOutcome::Invalid);
        }

        let client_id = match extract_client_id(raw) {
            Ok(id) => id,
            Err(TokenError::Invalid) => return Ok(ScanOutcome::Invalid),
            Err(TokenError::Malformed(reason) | TokenError::InvalidInput(reason)) => {
                return Ok(ScanOutcome::MalformedToken { reason })
            }
        };

        let Some(record) = self.store.find_barcode_by_client(client_id)? else {
            return Ok(ScanOutcome::Unknown { client_id });
        };

        if record.token != raw {
            return Ok(ScanOutcome::Mismatched { client_id });
        }

        let Some(client) = self.store.find_client(client_id)? else {
            return Ok(ScanOutcome::Unknown { client_id });
        };

        if record.status != BarcodeStatus::Active {
            return Ok(ScanOutcome::Rejected {
                client_id,
                client_name: client.name,
                status: record.status,
            });
        }

        let check_in =
            AttendanceDesk::new(self.store).check_in(client_id, self.allow_duplicate_checkin)?;

        Ok(ScanOutcome::Accepted {
            client_id,
            barcode_id: record.id,
            subscription: client.subscription_state(Local::now().date_naive()),
            client_status: client.status,
            client_name: client.name,
            check_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gympass_shared::{TokenGenerator, TokenScheme};

    use crate::lifecycle::BarcodeLifecycle;
    use crate::testing::{add_member, fixture, member_ending, Fixture};

    fn today_count(db: &gympass_store::Database) -> u64 {
        db.count_attendance_on(Local::now().date_naive()).unwrap()
    }

    #[test]
    fn test_structurally_invalid() {
        let fx = fixture();
        let scanner = ScanValidator::new(&fx.db, true);

        for raw in ["", "short", "XYZ004220261019093012deadbeef", "   "] {
            assert_eq!(scanner.validate_and_resolve(raw).unwrap(), ScanOutcome::Invalid);
        }
    }

    #[test]
    fn test_malformed_client_segment() {
        let fx = fixture();
        let scanner = ScanValidator::new(&fx.db, true);

        let outcome = scanner
            .validate_and_resolve("GYMab1220261019093012deadbeef")
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::MalformedToken { .. }));
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn test_unknown_client_segment() {
        let fx = fixture();
        let scanner = ScanValidator::new(&fx.db, true);
        let token = TokenGenerator::default().generate(42).unwrap();

        assert_eq!(
            scanner.validate_and_resolve(token.as_str()).unwrap(),
            ScanOutcome::Unknown { client_id: 42 }
        );
    }

    #[test]
    fn test_accepted_checks_in() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let issued = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder)
            .generate_new(id, None)
            .unwrap();
        let scanner = ScanValidator::new(&fx.db, true);

        let outcome = scanner
            .validate_and_resolve(&format!("  {}\n", issued.token))
            .unwrap();
        match &outcome {
            ScanOutcome::Accepted {
                client_id,
                barcode_id,
                client_name,
                subscription,
                client_status,
                check_in: CheckIn::Recorded { .. },
            } => {
                assert_eq!(*client_id, id);
                assert_eq!(*barcode_id, issued.record_id);
                assert_eq!(client_name, "Sam Rivera");
                assert!(matches!(subscription, SubscriptionState::Active { .. }));
                assert_eq!(*client_status, ClientStatus::Active);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(outcome.message(), "Welcome, Sam Rivera! Checked in.");
        assert_eq!(today_count(&fx.db), 1);
    }

    #[test]
    fn test_inactive_badge_rejected_without_attendance() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);
        let issued = lifecycle.generate_new(id, None).unwrap();
        lifecycle.deactivate(issued.record_id).unwrap();

        let outcome = ScanValidator::new(&fx.db, true)
            .validate_and_resolve(issued.token.as_str())
            .unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Rejected {
                client_id: id,
                client_name: "Sam Rivera".to_string(),
                status: BarcodeStatus::Inactive
            }
        );
        assert_eq!(
            outcome.message(),
            format!("Barcode for Sam Rivera (client {id}) is inactive")
        );
        assert_eq!(today_count(&fx.db), 0);
    }

    #[test]
    fn test_superseded_token_mismatched() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);
        let old = lifecycle.generate_new(id, None).unwrap();
        lifecycle.renew(id).unwrap();

        assert_eq!(
            ScanValidator::new(&fx.db, true)
                .validate_and_resolve(old.token.as_str())
                .unwrap(),
            ScanOutcome::Mismatched { client_id: id }
        );
        assert_eq!(today_count(&fx.db), 0);
    }

    #[test]
    fn test_duplicate_scan_policy() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let issued = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder)
            .generate_new(id, None)
            .unwrap();
        let scanner = ScanValidator::new(&fx.db, false);

        scanner.validate_and_resolve(issued.token.as_str()).unwrap();
        let second = scanner.validate_and_resolve(issued.token.as_str()).unwrap();

        assert!(second.is_accepted());
        assert_eq!(second.message(), "Sam Rivera already checked in today.");
        assert_eq!(today_count(&fx.db), 1);
    }

    #[test]
    fn test_delimited_tokens_resolve() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let generator = TokenGenerator::new(TokenScheme::Delimited);
        let issued = BarcodeLifecycle::new(&fx.db, generator, &fx.encoder)
            .generate_new(id, None)
            .unwrap();

        assert!(ScanValidator::new(&fx.db, true)
            .validate_and_resolve(issued.token.as_str())
            .unwrap()
            .is_accepted());
    }

    fn scan_member(fx: &Fixture, id: ClientId) -> ScanOutcome {
        let issued = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder)
            .generate_new(id, None)
            .unwrap();
        ScanValidator::new(&fx.db, true)
            .validate_and_resolve(issued.token.as_str())
            .unwrap()
    }

    #[test]
    fn test_subscription_ending_soon_warns() {
        let fx = fixture();
        let today = Local::now().date_naive();
        let id = fx
            .db
            .add_client(&member_ending("Sam Rivera", today + Duration::days(3)))
            .unwrap();

        let outcome = scan_member(&fx, id);
        assert!(outcome.is_accepted());
        assert_eq!(
            outcome.message(),
            "Welcome, Sam Rivera! Checked in. Warning: subscription ends in 3 day(s)"
        );
    }

    #[test]
    fn test_lapsed_suspended_member_still_admitted_with_warning() {
        let fx = fixture();
        let today = Local::now().date_naive();
        let id = fx
            .db
            .add_client(&member_ending("Sam Rivera", today - Duration::days(2)))
            .unwrap();
        fx.db.set_client_status(id, ClientStatus::Suspended).unwrap();

        let outcome = scan_member(&fx, id);
        match &outcome {
            ScanOutcome::Accepted {
                subscription,
                client_status,
                ..
            } => {
                assert_eq!(*subscription, SubscriptionState::Lapsed { days_overdue: 2 });
                assert_eq!(*client_status, ClientStatus::Suspended);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            outcome.message(),
            "Welcome, Sam Rivera! Checked in. \
             Warning: client is suspended; subscription lapsed (2 days ago)"
        );
        assert_eq!(today_count(&fx.db), 1);
    }
}
