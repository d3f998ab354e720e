//! Badge lifecycle: issuing, activating, deactivating and renewing.
//!
//! ```text
//!   (none) ──generate_new──▶ active ◀──activate── inactive
//!                              │  ──deactivate──▶    │
//!                              │                     │
//!          generate_new: renewed      renew: expired
//! ```
//!
//! `expired` and `renewed` are terminal. Issuing a badge writes the image
//! first and the record second; if the record write fails the image is
//! deleted again and the caller gets [`GymError::PartialFailure`].

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use gympass_shared::{BarcodeStatus, ClientId, RecordId, Token, TokenGenerator};
use gympass_store::{BarcodeRecord, Client, RecordStore, StoreError};

use crate::artifacts::SymbolEncoder;
use crate::error::{GymError, Result};

/// A record retired while issuing a new badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Retired {
    pub record_id: RecordId,
    pub status: BarcodeStatus,
}

/// Result of [`BarcodeLifecycle::generate_new`] and [`BarcodeLifecycle::renew`].
#[derive(Debug, Clone, Serialize)]
pub struct IssuedBarcode {
    pub record_id: RecordId,
    pub client_id: ClientId,
    pub token: Token,
    pub artifact: PathBuf,
    pub retired: Option<Retired>,
}

/// Result of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BarcodeTransition {
    pub record_id: RecordId,
    pub client_id: ClientId,
    pub from: BarcodeStatus,
    pub to: BarcodeStatus,
    /// `false` when the record was already in the target state.
    pub changed: bool,
}

pub struct BarcodeLifecycle<'a, S: RecordStore> {
    store: &'a S,
    generator: TokenGenerator,
    encoder: &'a SymbolEncoder,
}

impl<'a, S: RecordStore> BarcodeLifecycle<'a, S> {
    pub fn new(store: &'a S, generator: TokenGenerator, encoder: &'a SymbolEncoder) -> Self {
        Self {
            store,
            generator,
            encoder,
        }
    }

    /// Issue a fresh badge. The client's current active record, if any, is
    /// retired as `renewed` in the same transaction as the insert.
    ///
    /// `label` defaults to the client's name and only shows up in logs.
    pub fn generate_new(&self, client_id: ClientId, label: Option<&str>) -> Result<IssuedBarcode> {
        let client = self.client(client_id)?;
        let retire = self
            .store
            .find_barcode_by_client(client_id)?
            .filter(|r| r.status == BarcodeStatus::Active)
            .map(|r| Retired {
                record_id: r.id,
                status: BarcodeStatus::Renewed,
            });

        self.issue(&client, retire, label)
    }

    /// Expire the client's current record (unless it is already terminal)
    /// and issue a fresh badge. Without a prior record this is a plain
    /// [`generate_new`](Self::generate_new).
    pub fn renew(&self, client_id: ClientId) -> Result<IssuedBarcode> {
        let client = self.client(client_id)?;
        let retire = self
            .store
            .find_barcode_by_client(client_id)?
            .filter(|r| !r.status.is_terminal())
            .map(|r| Retired {
                record_id: r.id,
                status: BarcodeStatus::Expired,
            });

        self.issue(&client, retire, None)
    }

    /// `inactive → active`. Any other active record of the same client is
    /// demoted to `inactive`.
    pub fn activate(&self, record_id: RecordId) -> Result<BarcodeTransition> {
        let record = self.record(record_id)?;
        let to = BarcodeStatus::Active;

        match record.status {
            BarcodeStatus::Active => Ok(unchanged(&record)),
            BarcodeStatus::Inactive => {
                let demoted = self
                    .store
                    .activate_barcode_exclusive(record_id)
                    .map_err(|e| not_found_as(e, record_id))?;
                info!(record_id, client_id = record.client_id, demoted, "Barcode activated");
                Ok(changed(&record, to))
            }
            from => Err(GymError::IllegalTransition { record_id, from, to }),
        }
    }

    /// `active → inactive`.
    pub fn deactivate(&self, record_id: RecordId) -> Result<BarcodeTransition> {
        let record = self.record(record_id)?;
        let to = BarcodeStatus::Inactive;

        match record.status {
            BarcodeStatus::Inactive => Ok(unchanged(&record)),
            BarcodeStatus::Active => {
                self.store
                    .update_barcode_status(record_id, to)
                    .map_err(|e| not_found_as(e, record_id))?;
                info!(record_id, client_id = record.client_id, "Barcode deactivated");
                Ok(changed(&record, to))
            }
            from => Err(GymError::IllegalTransition { record_id, from, to }),
        }
    }

    fn issue(
        &self,
        client: &Client,
        retire: Option<Retired>,
        label: Option<&str>,
    ) -> Result<IssuedBarcode> {
        let token = self.generator.generate(client.id)?;
        let artifact = self
            .encoder
            .encode(token.as_str(), Some(label.unwrap_or(&client.name)))?;

        let inserted = match retire {
            None => self.store.create_barcode(client.id, token.as_str()),
            Some(r) => self
                .store
                .replace_barcode(Some((r.record_id, r.status)), client.id, token.as_str()),
        };

        let record_id = match inserted {
            Ok(id) => id,
            Err(source) => {
                let artifact_removed = match self.encoder.remove(token.as_str()) {
                    Ok(removed) => removed,
                    Err(e) => {
                        warn!(path = %artifact.display(), error = %e, "Orphaned barcode image left behind");
                        false
                    }
                };
                warn!(client_id = client.id, error = %source, artifact_removed, "Barcode record not saved");
                return Err(GymError::PartialFailure {
                    artifact,
                    artifact_removed,
                    source,
                });
            }
        };

        info!(
            record_id,
            client_id = client.id,
            retired = ?retire.map(|r| r.record_id),
            "Barcode issued"
        );

        Ok(IssuedBarcode {
            record_id,
            client_id: client.id,
            token,
            artifact,
            retired: retire,
        })
    }

    fn client(&self, client_id: ClientId) -> Result<Client> {
        self.store
            .find_client(client_id)?
            .ok_or(GymError::ClientNotFound(client_id))
    }

    fn record(&self, record_id: RecordId) -> Result<BarcodeRecord> {
        self.store
            .get_barcode(record_id)
            .map_err(|e| not_found_as(e, record_id))
    }
}

fn not_found_as(e: StoreError, record_id: RecordId) -> GymError {
    match e {
        StoreError::NotFound => GymError::BarcodeNotFound(record_id),
        other => GymError::Store(other),
    }
}

fn unchanged(record: &BarcodeRecord) -> BarcodeTransition {
    BarcodeTransition {
        record_id: record.id,
        client_id: record.client_id,
        from: record.status,
        to: record.status,
        changed: false,
    }
}

fn changed(record: &BarcodeRecord, to: BarcodeStatus) -> BarcodeTransition {
    BarcodeTransition {
        record_id: record.id,
        client_id: record.client_id,
        from: record.status,
        to,
        changed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, Utc};
    use gympass_store::Database;

    use crate::testing::{add_member, fixture};

    #[test]
    fn test_generate_new_issues_active_record_and_image() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);

        let issued = lifecycle.generate_new(id, None).unwrap();
        assert_eq!(issued.client_id, id);
        assert_eq!(issued.token.client_id().unwrap(), id);
        assert!(issued.artifact.is_file());
        assert_eq!(issued.retired, None);

        let record = fx.db.get_barcode(issued.record_id).unwrap();
        assert_eq!(record.status, BarcodeStatus::Active);
        assert_eq!(record.token, issued.token.as_str());
    }

    #[test]
    fn test_generate_new_retires_active_as_renewed() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);

        let first = lifecycle.generate_new(id, None).unwrap();
        let second = lifecycle.generate_new(id, Some("front desk")).unwrap();

        assert_eq!(
            second.retired,
            Some(Retired {
                record_id: first.record_id,
                status: BarcodeStatus::Renewed
            })
        );
        assert_eq!(
            fx.db.get_barcode(first.record_id).unwrap().status,
            BarcodeStatus::Renewed
        );
        assert_eq!(
            fx.db.find_barcode_by_client(id).unwrap().unwrap().id,
            second.record_id
        );
    }

    #[test]
    fn test_generate_new_unknown_client() {
        let fx = fixture();
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);
        assert!(matches!(
            lifecycle.generate_new(99, None),
            Err(GymError::ClientNotFound(99))
        ));
    }

    #[test]
    fn test_activate_deactivate_activate() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);
        let record_id = lifecycle.generate_new(id, None).unwrap().record_id;

        let off = lifecycle.deactivate(record_id).unwrap();
        assert_eq!((off.from, off.to, off.changed), (BarcodeStatus::Active, BarcodeStatus::Inactive, true));

        let on = lifecycle.activate(record_id).unwrap();
        assert_eq!((on.from, on.to, on.changed), (BarcodeStatus::Inactive, BarcodeStatus::Active, true));

        let again = lifecycle.activate(record_id).unwrap();
        assert!(!again.changed);
        assert_eq!(fx.db.get_barcode(record_id).unwrap().status, BarcodeStatus::Active);
    }

    #[test]
    fn test_activate_demotes_sibling() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);

        let old = lifecycle.generate_new(id, None).unwrap().record_id;
        lifecycle.deactivate(old).unwrap();
        let new = lifecycle.generate_new(id, None).unwrap().record_id;

        lifecycle.activate(old).unwrap();
        assert_eq!(fx.db.get_barcode(old).unwrap().status, BarcodeStatus::Active);
        assert_eq!(fx.db.get_barcode(new).unwrap().status, BarcodeStatus::Inactive);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);

        let old = lifecycle.generate_new(id, None).unwrap().record_id;
        lifecycle.renew(id).unwrap();

        assert!(matches!(
            lifecycle.activate(old),
            Err(GymError::IllegalTransition {
                from: BarcodeStatus::Expired,
                to: BarcodeStatus::Active,
                ..
            })
        ));
        assert!(matches!(
            lifecycle.deactivate(old),
            Err(GymError::IllegalTransition { .. })
        ));
        assert!(matches!(lifecycle.activate(12345), Err(GymError::BarcodeNotFound(12345))));
    }

    #[test]
    fn test_renew_expires_current_record() {
        let fx = fixture();
        let mut client_id = 0;
        for name in ["A", "B", "C", "D", "E", "F", "G"] {
            client_id = add_member(&fx.db, name);
        }
        assert_eq!(client_id, 7);

        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);
        let r1 = lifecycle.generate_new(7, None).unwrap();
        let r2 = lifecycle.renew(7).unwrap();

        let old = fx.db.get_barcode(r1.record_id).unwrap();
        let new = fx.db.get_barcode(r2.record_id).unwrap();
        assert_eq!(old.status, BarcodeStatus::Expired);
        assert_eq!(new.status, BarcodeStatus::Active);
        assert_ne!(new.token, old.token);
    }

    #[test]
    fn test_renew_without_prior_record() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let lifecycle = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder);

        let issued = lifecycle.renew(id).unwrap();
        assert_eq!(issued.retired, None);
        assert_eq!(fx.db.get_barcode(issued.record_id).unwrap().status, BarcodeStatus::Active);
    }

    /// Delegates to a real database but refuses to save barcode records.
    struct RejectingStore<'a>(&'a Database);

    impl RecordStore for RejectingStore<'_> {
        fn create_barcode(&self, _: ClientId, _: &str) -> gympass_store::Result<RecordId> {
            Err(StoreError::Constraint("UNIQUE constraint failed".to_string()))
        }
        fn update_barcode_status(&self, id: RecordId, s: BarcodeStatus) -> gympass_store::Result<()> {
            self.0.update_barcode_status(id, s)
        }
        fn find_barcode_by_client(&self, id: ClientId) -> gympass_store::Result<Option<BarcodeRecord>> {
            self.0.find_barcode_by_client(id)
        }
        fn get_barcode(&self, id: RecordId) -> gympass_store::Result<BarcodeRecord> {
            self.0.get_barcode(id)
        }
        fn replace_barcode(
            &self,
            _: Option<(RecordId, BarcodeStatus)>,
            _: ClientId,
            _: &str,
        ) -> gympass_store::Result<RecordId> {
            Err(StoreError::Constraint("UNIQUE constraint failed".to_string()))
        }
        fn activate_barcode_exclusive(&self, id: RecordId) -> gympass_store::Result<usize> {
            self.0.activate_barcode_exclusive(id)
        }
        fn find_client(&self, id: ClientId) -> gympass_store::Result<Option<Client>> {
            self.0.find_client(id)
        }
        fn has_attendance_on(&self, id: ClientId, on: NaiveDate) -> gympass_store::Result<bool> {
            self.0.has_attendance_on(id, on)
        }
        fn insert_attendance(
            &self,
            id: ClientId,
            at: DateTime<Utc>,
            on: NaiveDate,
        ) -> gympass_store::Result<RecordId> {
            self.0.insert_attendance(id, at, on)
        }
    }

    #[test]
    fn test_store_failure_removes_image() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let store = RejectingStore(&fx.db);
        let lifecycle = BarcodeLifecycle::new(&store, TokenGenerator::default(), &fx.encoder);

        match lifecycle.generate_new(id, None) {
            Err(GymError::PartialFailure {
                artifact,
                artifact_removed,
                source,
            }) => {
                assert!(artifact_removed);
                assert!(!artifact.exists());
                assert!(source.is_constraint());
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
        assert!(fx.db.find_barcode_by_client(id).unwrap().is_none());
    }

    #[test]
    fn test_store_failure_on_renew_keeps_old_badge() {
        let fx = fixture();
        let id = add_member(&fx.db, "Sam Rivera");
        let first = BarcodeLifecycle::new(&fx.db, TokenGenerator::default(), &fx.encoder)
            .generate_new(id, None)
            .unwrap();

        let store = RejectingStore(&fx.db);
        let lifecycle = BarcodeLifecycle::new(&store, TokenGenerator::default(), &fx.encoder);
        assert!(matches!(
            lifecycle.renew(id),
            Err(GymError::PartialFailure { artifact_removed: true, .. })
        ));

        let active = fx.db.find_barcode_by_client(id).unwrap().unwrap();
        assert_eq!(active.id, first.record_id);
        assert!(first.artifact.exists());
    }
}
