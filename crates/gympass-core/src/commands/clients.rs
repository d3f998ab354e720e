use chrono::Local;
use serde::Serialize;
use tracing::info;

use gympass_shared::{ClientId, ClientStatus, SubscriptionState};
use gympass_store::{BarcodeRecord, Client, NewClient, StoreError};

use super::{CommandResult, Reply};
use crate::state::Gym;

/// A client with the state of their subscription and current badge.
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetails {
    #[serde(flatten)]
    pub client: Client,
    pub subscription: SubscriptionState,
    pub barcode: Option<BarcodeRecord>,
}

pub fn add_client(gym: &Gym, new: NewClient) -> CommandResult<Client> {
    new.validate()?;

    let id = gym
        .db()
        .add_client(&new)
        .map_err(|e| format!("Failed to add client: {e}"))?;
    let client = gym
        .db()
        .get_client(id)
        .map_err(|e| format!("Failed to load client {id}: {e}"))?;

    info!(client_id = id, "Client added");
    Ok(Reply::new(format!("Client {} added (id {id})", client.name), client))
}

pub fn update_client(gym: &Gym, client: Client) -> CommandResult<Client> {
    NewClient {
        name: client.name.clone(),
        phone: client.phone.clone(),
        email: client.email.clone(),
        subscription_type: client.subscription_type,
        subscription_start: client.subscription_start,
        subscription_end: client.subscription_end,
    }
    .validate()?;

    let updated = gym
        .db()
        .update_client(&client)
        .map_err(|e| format!("Failed to update client: {e}"))?;
    if !updated {
        return Err(format!("Client {} not found", client.id));
    }

    let client = gym
        .db()
        .get_client(client.id)
        .map_err(|e| format!("Failed to load client {}: {e}", client.id))?;
    Ok(Reply::new(format!("Client {} updated", client.name), client))
}

pub fn set_client_status(gym: &Gym, id: ClientId, status: ClientStatus) -> CommandResult<()> {
    let updated = gym
        .db()
        .set_client_status(id, status)
        .map_err(|e| format!("Failed to update client: {e}"))?;
    if !updated {
        return Err(format!("Client {id} not found"));
    }
    Ok(Reply::new(format!("Client {id} is now {status}"), ()))
}

/// Delete a client with no attendance or barcode history.
pub fn delete_client(gym: &Gym, id: ClientId) -> CommandResult<()> {
    match gym.db().delete_client(id) {
        Ok(true) => {
            info!(client_id = id, "Client deleted");
            Ok(Reply::new(format!("Client {id} deleted"), ()))
        }
        Ok(false) => Err(format!("Client {id} not found")),
        Err(StoreError::Constraint(_)) => Err(format!(
            "Client {id} has attendance or barcode records and cannot be deleted; \
             set the client inactive instead"
        )),
        Err(e) => Err(format!("Failed to delete client: {e}")),
    }
}

pub fn get_client(gym: &Gym, id: ClientId) -> CommandResult<ClientDetails> {
    let client = gym
        .db()
        .find_client(id)
        .map_err(|e| format!("Failed to load client: {e}"))?
        .ok_or_else(|| format!("Client {id} not found"))?;
    let barcode = gym
        .db()
        .find_barcode_by_client(id)
        .map_err(|e| format!("Failed to load barcode: {e}"))?;
    let subscription = client.subscription_state(Local::now().date_naive());

    Ok(Reply::new(
        format!("{}: subscription {subscription}", client.name),
        ClientDetails {
            client,
            subscription,
            barcode,
        },
    ))
}

pub fn list_clients(gym: &Gym) -> CommandResult<Vec<Client>> {
    let clients = gym
        .db()
        .list_clients()
        .map_err(|e| format!("Failed to list clients: {e}"))?;
    Ok(Reply::new(format!("{} client(s)", clients.len()), clients))
}

pub fn search_clients(gym: &Gym, query: &str) -> CommandResult<Vec<Client>> {
    let clients = gym
        .db()
        .search_clients(query)
        .map_err(|e| format!("Search failed: {e}"))?;
    Ok(Reply::new(
        format!("{} client(s) match {query:?}", clients.len()),
        clients,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::barcodes::generate_barcode;
    use crate::testing::{member, test_gym};

    #[test]
    fn test_add_rejects_missing_name() {
        let (gym, _tmp) = test_gym();
        let mut new = member("Sam Rivera");
        new.name = " ".to_string();
        assert_eq!(add_client(&gym, new).unwrap_err(), "client name is required");
    }

    #[test]
    fn test_add_get_and_update() {
        let (gym, _tmp) = test_gym();
        let client = add_client(&gym, member("Sam Rivera")).unwrap().data;

        let details = get_client(&gym, client.id).unwrap().data;
        assert_eq!(details.client, client);
        assert!(details.barcode.is_none());

        let mut edited = client.clone();
        edited.phone = "0551111111".to_string();
        let updated = update_client(&gym, edited).unwrap().data;
        assert_eq!(updated.phone, "0551111111");

        let mut missing = client;
        missing.id = 999;
        assert!(update_client(&gym, missing).is_err());
    }

    #[test]
    fn test_delete_with_history_is_refused() {
        let (gym, _tmp) = test_gym();
        let free = add_client(&gym, member("Ana Costa")).unwrap().data.id;
        let badged = add_client(&gym, member("Sam Rivera")).unwrap().data.id;
        generate_barcode(&gym, badged).unwrap();

        assert!(delete_client(&gym, free).is_ok());
        assert!(delete_client(&gym, free).is_err());

        let err = delete_client(&gym, badged).unwrap_err();
        assert!(err.contains("set the client inactive"));

        set_client_status(&gym, badged, ClientStatus::Inactive).unwrap();
        assert_eq!(
            gym.db().get_client(badged).unwrap().status,
            ClientStatus::Inactive
        );
    }

    #[test]
    fn test_list_and_search() {
        let (gym, _tmp) = test_gym();
        add_client(&gym, member("Sam Rivera")).unwrap();
        add_client(&gym, member("Ana Costa")).unwrap();

        assert_eq!(list_clients(&gym).unwrap().data.len(), 2);
        let found = search_clients(&gym, "riv").unwrap().data;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sam Rivera");
        assert!(search_clients(&gym, "r").unwrap().data.is_empty());
    }
}
