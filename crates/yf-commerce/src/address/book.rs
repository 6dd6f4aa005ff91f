//! The address store.
//!
//! Unlike the cart and wishlist there is no optimistic mode: the local list
//! only ever changes to reflect a confirmed server response.

use crate::address::{AddressDraft, ShippingAddress};
use crate::api::CommerceApi;
use crate::error::{CommerceError, RemoteError};
use crate::ids::AddressId;
use crate::status::RemoteStatus;
use yf_auth::Session;

/// Remote operations the address store performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressOp {
    Fetch,
    Add,
    Update,
    Delete,
}

/// The signed-in user's saved addresses.
///
/// At most one address is marked default in this view.
#[derive(Debug, Default)]
pub struct AddressBook {
    addresses: Vec<ShippingAddress>,
    status: RemoteStatus<AddressOp>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses as last confirmed by the server.
    pub fn addresses(&self) -> &[ShippingAddress] {
        &self.addresses
    }

    /// Get an address by id.
    pub fn get(&self, id: AddressId) -> Option<&ShippingAddress> {
        self.addresses.iter().find(|a| a.id == id)
    }

    /// The default address, if one is marked.
    pub fn default_address(&self) -> Option<&ShippingAddress> {
        self.addresses.iter().find(|a| a.is_default)
    }

    /// Status of the most recent remote operation.
    pub fn status(&self) -> &RemoteStatus<AddressOp> {
        &self.status
    }

    /// The recorded remote error, handed out once.
    pub fn take_error(&mut self) -> Option<RemoteError> {
        self.status.take_error()
    }

    /// Replace the list with the server's.
    pub async fn fetch(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
    ) -> Result<&[ShippingAddress], CommerceError> {
        self.status.begin(AddressOp::Fetch);
        let mut addresses = self.confirm(AddressOp::Fetch, api.list_addresses(session).await)?;
        keep_first_default(&mut addresses);
        self.addresses = addresses;
        tracing::info!(count = self.addresses.len(), "addresses fetched");
        Ok(&self.addresses)
    }

    /// Save a new address.
    pub async fn add(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        draft: &AddressDraft,
    ) -> Result<ShippingAddress, CommerceError> {
        self.status.begin(AddressOp::Add);
        let saved = self.confirm(AddressOp::Add, api.create_address(session, draft).await)?;
        self.upsert(saved.clone());
        tracing::info!(address_id = %saved.id, "address added");
        Ok(saved)
    }

    /// Replace a saved address.
    pub async fn update(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        id: AddressId,
        draft: &AddressDraft,
    ) -> Result<(), CommerceError> {
        self.status.begin(AddressOp::Update);
        let saved = self.confirm(AddressOp::Update, api.update_address(session, id, draft).await)?;
        self.upsert(saved);
        tracing::info!(address_id = %id, "address updated");
        Ok(())
    }

    /// Delete a saved address.
    pub async fn delete(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        id: AddressId,
    ) -> Result<(), CommerceError> {
        self.status.begin(AddressOp::Delete);
        self.confirm(AddressOp::Delete, api.delete_address(session, id).await)?;
        self.addresses.retain(|a| a.id != id);
        tracing::info!(address_id = %id, "address deleted");
        Ok(())
    }

    fn confirm<T>(&mut self, op: AddressOp, result: Result<T, RemoteError>) -> Result<T, CommerceError> {
        match result {
            Ok(value) => {
                self.status.succeed();
                Ok(value)
            }
            Err(e) => {
                self.status.fail(op, e.clone());
                Err(e.into())
            }
        }
    }

    fn upsert(&mut self, saved: ShippingAddress) {
        if saved.is_default {
            for other in self.addresses.iter_mut().filter(|a| a.id != saved.id) {
                other.is_default = false;
            }
        }
        match self.addresses.iter_mut().find(|a| a.id == saved.id) {
            Some(existing) => *existing = saved,
            None => self.addresses.push(saved),
        }
    }
}

fn keep_first_default(addresses: &mut [ShippingAddress]) {
    let mut seen = false;
    for address in addresses.iter_mut().filter(|a| a.is_default) {
        if seen {
            address.is_default = false;
        }
        seen = true;
    }
}
