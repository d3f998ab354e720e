//! Fixtures shared by the service tests.

use chrono::{Duration, Local, NaiveDate};
use tempfile::TempDir;

use gympass_shared::symbol::RenderOptions;
use gympass_shared::{ClientId, SubscriptionType};
use gympass_store::{Database, NewClient};

use crate::artifacts::{ArtifactDir, SymbolEncoder};
use crate::config::GymConfig;
use crate::state::Gym;

pub(crate) struct Fixture {
    pub db: Database,
    pub encoder: SymbolEncoder,
    pub _tmp: TempDir,
}

pub(crate) fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let db = Database::open_at(&tmp.path().join("gym.db")).unwrap();
    let encoder = SymbolEncoder::new(
        ArtifactDir::new(tmp.path().join("barcodes")),
        RenderOptions::default(),
    );
    Fixture {
        db,
        encoder,
        _tmp: tmp,
    }
}

/// A monthly member with a month left, so check-ins carry no warning.
pub(crate) fn member(name: &str) -> NewClient {
    member_ending(name, Local::now().date_naive() + Duration::days(30))
}

pub(crate) fn member_ending(name: &str, end: NaiveDate) -> NewClient {
    NewClient {
        name: name.to_string(),
        phone: "0550000000".to_string(),
        email: String::new(),
        subscription_type: SubscriptionType::Monthly,
        subscription_start: end - Duration::days(30),
        subscription_end: end,
    }
}

pub(crate) fn add_member(db: &Database, name: &str) -> ClientId {
    db.add_client(&member(name)).unwrap()
}

/// A `Gym` rooted in a temporary directory.
pub(crate) fn test_gym() -> (Gym, TempDir) {
    let tmp = TempDir::new().unwrap();
    let config = GymConfig {
        db_path: tmp.path().join("gym.db"),
        barcode_dir: tmp.path().join("barcodes"),
        backup_dir: tmp.path().join("backups"),
        ..GymConfig::default()
    };
    (Gym::open(config).unwrap(), tmp)
}
