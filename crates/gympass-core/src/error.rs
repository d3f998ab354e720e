use std::path::PathBuf;

use thiserror::Error;

use gympass_shared::{BarcodeStatus, ClientId, RecordId, SymbolError, TokenError};
use gympass_store::StoreError;

/// Failure of a service operation.  Everything here is recoverable at the
/// operation boundary; nothing is retried automatically.
#[derive(Error, Debug)]
pub enum GymError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Barcode encoding failed: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Barcode {record_id} cannot go from {from} to {to}")]
    IllegalTransition {
        record_id: RecordId,
        from: BarcodeStatus,
        to: BarcodeStatus,
    },

    #[error("Client {0} not found")]
    ClientNotFound(ClientId),

    #[error("Barcode record {0} not found")]
    BarcodeNotFound(RecordId),

    /// The badge image was written but the record could not be saved.
    #[error(
        "Barcode image {} written but record not saved (image removed: {artifact_removed}): {source}",
        artifact.display()
    )]
    PartialFailure {
        artifact: PathBuf,
        artifact_removed: bool,
        #[source]
        source: StoreError,
    },
}

impl From<TokenError> for GymError {
    fn from(e: TokenError) -> Self {
        GymError::InvalidInput(e.to_string())
    }
}

impl From<SymbolError> for GymError {
    fn from(e: SymbolError) -> Self {
        match e {
            SymbolError::Io(io) => GymError::Io(io),
            other => GymError::Encoding(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GymError>;
