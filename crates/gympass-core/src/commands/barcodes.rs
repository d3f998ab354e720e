use std::path::{Path, PathBuf};

use gympass_shared::{BarcodeStatus, ClientId, RecordId};
use gympass_store::{BarcodeListing, BarcodeRecord, StoreError};

use super::{CommandResult, Reply};
use crate::error::GymError;
use crate::lifecycle::{BarcodeTransition, IssuedBarcode};
use crate::scan::ScanOutcome;
use crate::state::Gym;

pub fn generate_barcode(gym: &Gym, client_id: ClientId) -> CommandResult<IssuedBarcode> {
    let issued = gym
        .lifecycle()
        .generate_new(client_id, None)
        .map_err(|e| format!("Barcode generation failed: {e}"))?;
    Ok(Reply::new(
        format!("Barcode {} issued to client {client_id}", issued.token),
        issued,
    ))
}

pub fn renew_barcode(gym: &Gym, client_id: ClientId) -> CommandResult<IssuedBarcode> {
    let issued = gym
        .lifecycle()
        .renew(client_id)
        .map_err(|e| format!("Barcode renewal failed: {e}"))?;
    let message = match issued.retired {
        Some(old) => format!(
            "Barcode {} expired; {} issued to client {client_id}",
            old.record_id, issued.token
        ),
        None => format!("Barcode {} issued to client {client_id}", issued.token),
    };
    Ok(Reply::new(message, issued))
}

pub fn activate_barcode(gym: &Gym, record_id: RecordId) -> CommandResult<BarcodeTransition> {
    let t = gym
        .lifecycle()
        .activate(record_id)
        .map_err(|e| format!("Activation failed: {e}"))?;
    Ok(Reply::new(transition_message(&t), t))
}

pub fn deactivate_barcode(gym: &Gym, record_id: RecordId) -> CommandResult<BarcodeTransition> {
    let t = gym
        .lifecycle()
        .deactivate(record_id)
        .map_err(|e| format!("Deactivation failed: {e}"))?;
    Ok(Reply::new(transition_message(&t), t))
}

fn transition_message(t: &BarcodeTransition) -> String {
    if t.changed {
        format!("Barcode {} is now {}", t.record_id, t.to)
    } else {
        format!("Barcode {} was already {}", t.record_id, t.to)
    }
}

pub fn list_barcodes(gym: &Gym, status: Option<BarcodeStatus>) -> CommandResult<Vec<BarcodeListing>> {
    let listings = gym
        .db()
        .list_barcodes(status)
        .map_err(|e| format!("Failed to list barcodes: {e}"))?;
    Ok(Reply::new(format!("{} barcode(s)", listings.len()), listings))
}

pub fn client_barcodes(gym: &Gym, client_id: ClientId) -> CommandResult<Vec<BarcodeRecord>> {
    let records = gym
        .db()
        .list_barcodes_for_client(client_id)
        .map_err(|e| format!("Failed to list barcodes: {e}"))?;
    Ok(Reply::new(
        format!("{} barcode(s) for client {client_id}", records.len()),
        records,
    ))
}

pub fn search_barcodes(gym: &Gym, query: &str) -> CommandResult<Vec<BarcodeListing>> {
    let listings = gym
        .db()
        .search_barcodes(query)
        .map_err(|e| format!("Search failed: {e}"))?;
    Ok(Reply::new(
        format!("{} barcode(s) match {query:?}", listings.len()),
        listings,
    ))
}

/// Copy a record's badge image to `dest`, re-rendering it first if the file
/// has gone missing.
pub fn export_barcode(gym: &Gym, record_id: RecordId, dest: &Path) -> CommandResult<PathBuf> {
    let record = match gym.db().get_barcode(record_id) {
        Ok(r) => r,
        Err(StoreError::NotFound) => return Err(GymError::BarcodeNotFound(record_id).to_string()),
        Err(e) => return Err(format!("Failed to load barcode: {e}")),
    };

    let encoder = gym.encoder();
    if !encoder.exists(&record.token) {
        encoder
            .encode(&record.token, None)
            .map_err(|e| format!("Failed to render barcode image: {e}"))?;
    }

    let path = encoder
        .export(&record.token, dest)
        .map_err(|e| format!("Export failed: {e}"))?;
    Ok(Reply::new(format!("Barcode image saved to {}", path.display()), path))
}

/// Re-render the image of every active badge, e.g. after changing the bar
/// dimensions. Rendering runs on the blocking pool.
pub async fn rerender_active(gym: &Gym) -> CommandResult<Vec<PathBuf>> {
    let active = gym
        .db()
        .list_barcodes(Some(BarcodeStatus::Active))
        .map_err(|e| format!("Failed to list barcodes: {e}"))?;

    let handles: Vec<_> = active
        .into_iter()
        .map(|l| {
            gym.encoder()
                .encode_in_background(l.record.token, Some(l.client_name))
        })
        .collect();

    let mut paths = Vec::with_capacity(handles.len());
    for handle in handles {
        let path = handle
            .await
            .map_err(|e| format!("Render task failed: {e}"))?
            .map_err(|e| format!("Render failed: {e}"))?;
        paths.push(path);
    }

    Ok(Reply::new(
        format!("{} barcode image(s) rendered", paths.len()),
        paths,
    ))
}

/// Resolve one line of scanner input.
pub fn scan(gym: &Gym, raw: &str) -> CommandResult<ScanOutcome> {
    let outcome = gym
        .scanner()
        .validate_and_resolve(raw)
        .map_err(|e| format!("Scan failed: {e}"))?;
    Ok(Reply::new(outcome.message(), outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::clients::add_client;
    use crate::testing::{member, test_gym};

    #[test]
    fn test_issue_transition_and_scan() {
        let (gym, _tmp) = test_gym();
        let id = add_client(&gym, member("Sam Rivera")).unwrap().data.id;

        let issued = generate_barcode(&gym, id).unwrap().data;
        let off = deactivate_barcode(&gym, issued.record_id).unwrap();
        assert_eq!(off.message, format!("Barcode {} is now inactive", issued.record_id));

        let refused = scan(&gym, issued.token.as_str()).unwrap();
        assert!(!refused.data.is_accepted());

        let again = deactivate_barcode(&gym, issued.record_id).unwrap();
        assert!(!again.data.changed);

        activate_barcode(&gym, issued.record_id).unwrap();
        assert!(scan(&gym, issued.token.as_str()).unwrap().data.is_accepted());
    }

    #[test]
    fn test_renew_and_listings() {
        let (gym, _tmp) = test_gym();
        let id = add_client(&gym, member("Sam Rivera")).unwrap().data.id;

        let first = generate_barcode(&gym, id).unwrap().data;
        let renewed = renew_barcode(&gym, id).unwrap();
        assert!(renewed.message.contains("expired"));

        assert_eq!(client_barcodes(&gym, id).unwrap().data.len(), 2);
        assert_eq!(
            list_barcodes(&gym, Some(BarcodeStatus::Expired)).unwrap().data[0].record.id,
            first.record_id
        );
        assert_eq!(list_barcodes(&gym, None).unwrap().data.len(), 2);
        assert_eq!(search_barcodes(&gym, "GYM").unwrap().data.len(), 2);
    }

    #[test]
    fn test_export_rerenders_missing_image() {
        let (gym, tmp) = test_gym();
        let id = add_client(&gym, member("Sam Rivera")).unwrap().data.id;
        let issued = generate_barcode(&gym, id).unwrap().data;
        std::fs::remove_file(&issued.artifact).unwrap();

        let dest = tmp.path().join("export/sam.png");
        assert_eq!(export_barcode(&gym, issued.record_id, &dest).unwrap().data, dest);
        assert!(dest.is_file());
        assert!(issued.artifact.is_file());

        assert!(export_barcode(&gym, 777, &dest).is_err());
    }

    #[tokio::test]
    async fn test_rerender_active() {
        let (gym, _tmp) = test_gym();
        let sam = add_client(&gym, member("Sam Rivera")).unwrap().data.id;
        let ana = add_client(&gym, member("Ana Costa")).unwrap().data.id;
        let issued = generate_barcode(&gym, sam).unwrap().data;
        generate_barcode(&gym, ana).unwrap();
        std::fs::remove_file(&issued.artifact).unwrap();

        let paths = rerender_active(&gym).await.unwrap().data;
        assert_eq!(paths.len(), 2);
        assert!(issued.artifact.is_file());
    }

    #[test]
    fn test_generate_for_unknown_client() {
        let (gym, _tmp) = test_gym();
        let err = generate_barcode(&gym, 5).unwrap_err();
        assert!(err.contains("Client 5 not found"));
    }
}
