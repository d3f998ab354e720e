use std::path::{Path, PathBuf};

use tracing::info;

use gympass_store::backup::{BackupPayload, ImportStats};

use super::{CommandResult, Reply};
use crate::state::Gym;

/// Write a JSON backup to `dest`, or to a timestamped file in the
/// configured backup directory.
pub fn save_backup(gym: &Gym, dest: Option<&Path>) -> CommandResult<PathBuf> {
    let payload = gym
        .db()
        .export_backup()
        .map_err(|e| format!("Export failed: {e}"))?;
    let json =
        serde_json::to_string_pretty(&payload).map_err(|e| format!("Serialization failed: {e}"))?;

    let path = match dest {
        Some(p) => p.to_path_buf(),
        None => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            gym.config()
                .backup_dir
                .join(format!("gympass_backup_{timestamp}.json"))
        }
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create backup dir: {e}"))?;
    }
    std::fs::write(&path, json.as_bytes())
        .map_err(|e| format!("Failed to write backup file: {e}"))?;

    info!(
        path = %path.display(),
        clients = payload.clients.len(),
        barcodes = payload.barcodes.len(),
        attendance = payload.attendance.len(),
        "Backup saved"
    );
    Ok(Reply::new(format!("Backup saved to {}", path.display()), path))
}

/// Merge a JSON backup into the database. Existing rows are kept; see
/// [`Database::import_backup`](gympass_store::Database::import_backup) for
/// how conflicting ids are handled.
pub fn restore_backup(gym: &Gym, src: &Path) -> CommandResult<ImportStats> {
    let json = std::fs::read_to_string(src)
        .map_err(|e| format!("Failed to read backup file: {e}"))?;
    let payload: BackupPayload =
        serde_json::from_str(&json).map_err(|e| format!("Invalid backup file: {e}"))?;

    let stats = gym
        .db()
        .import_backup(&payload)
        .map_err(|e| format!("Import failed: {e}"))?;

    let mut message = format!(
        "Restored {} client(s), {} barcode(s), {} attendance record(s); {} already present, {} skipped",
        stats.clients_imported,
        stats.barcodes_imported,
        stats.attendance_imported,
        stats.already_present,
        stats.skipped
    );
    if stats.clients_remapped > 0 {
        message.push_str(&format!(
            "; {} client(s) given new ids",
            stats.clients_remapped
        ));
    }
    Ok(Reply::new(message, stats))
}
