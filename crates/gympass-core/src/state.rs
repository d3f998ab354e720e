//! Process-wide context.
//!
//! [`Gym`] owns the database handle and the artifact encoder, built once at
//! start-up. Services borrow from it for the duration of one operation.

use gympass_shared::TokenGenerator;
use gympass_store::Database;

use crate::artifacts::{ArtifactDir, SymbolEncoder};
use crate::attendance::AttendanceDesk;
use crate::config::GymConfig;
use crate::error::Result;
use crate::lifecycle::BarcodeLifecycle;
use crate::scan::ScanValidator;

pub struct Gym {
    config: GymConfig,
    db: Database,
    encoder: SymbolEncoder,
    generator: TokenGenerator,
}

impl Gym {
    /// Open the database named by `config` (running migrations).
    pub fn open(config: GymConfig) -> Result<Self> {
        let db = Database::open_at(&config.db_path)?;
        Ok(Self::with_database(config, db))
    }

    pub fn with_database(config: GymConfig, db: Database) -> Self {
        let encoder = SymbolEncoder::new(
            ArtifactDir::new(config.barcode_dir.clone()),
            config.render_options(),
        );
        let generator = TokenGenerator::new(config.token_scheme);
        tracing::debug!(
            db = ?config.db_path,
            barcodes = ?config.barcode_dir,
            scheme = ?config.token_scheme,
            "Gym context ready"
        );

        Self {
            config,
            db,
            encoder,
            generator,
        }
    }

    pub fn config(&self) -> &GymConfig {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn encoder(&self) -> &SymbolEncoder {
        &self.encoder
    }

    pub fn lifecycle(&self) -> BarcodeLifecycle<'_, Database> {
        BarcodeLifecycle::new(&self.db, self.generator, &self.encoder)
    }

    pub fn scanner(&self) -> ScanValidator<'_, Database> {
        ScanValidator::new(&self.db, self.config.allow_duplicate_checkin)
    }

    pub fn desk(&self) -> AttendanceDesk<'_, Database> {
        AttendanceDesk::new(&self.db)
    }
}
