//! The wishlist engine.

use crate::api::CommerceApi;
use crate::error::{CommerceError, RemoteError};
use crate::ids::ProductId;
use crate::reconcile::{FetchTicket, Reconciler, SyncOutcome};
use crate::status::RemoteStatus;
use crate::wishlist::{ProductSnapshot, WishlistEntry};
use yf_auth::Session;

/// Remote operations the wishlist performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WishlistOp {
    Fetch,
    Add,
    Remove,
}

/// A set of saved products, keyed by [`ProductId`].
#[derive(Debug, Default)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
    sync: Reconciler<ProductId>,
    status: RemoteStatus<WishlistOp>,
}

impl Wishlist {
    /// Create an empty wishlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in the order they were saved.
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a product is saved.
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entries.iter().any(|e| e.product_id == product_id)
    }

    /// Status of the most recent remote operation.
    pub fn status(&self) -> &RemoteStatus<WishlistOp> {
        &self.status
    }

    /// The recorded remote error, handed out once.
    pub fn take_error(&mut self) -> Option<RemoteError> {
        self.status.take_error()
    }

    /// Save the product if absent, drop it if present.
    ///
    /// Returns whether the product is saved afterwards.
    pub fn toggle_local(&mut self, product: ProductSnapshot) -> bool {
        let product_id = product.id;
        if self.remove(product_id) {
            false
        } else {
            self.insert(WishlistEntry::new(product));
            true
        }
    }

    /// Empty the wishlist.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sync.clear();
        tracing::debug!("wishlist cleared");
    }

    fn insert(&mut self, entry: WishlistEntry) {
        let product_id = entry.product_id;
        match self.entries.iter_mut().find(|e| e.product_id == product_id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.sync.touch(product_id);
        tracing::debug!(product_id = %product_id, "wishlist entry saved");
    }

    fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != product_id);
        let removed = self.entries.len() < before;
        if removed {
            self.sync.tombstone(product_id);
            tracing::debug!(product_id = %product_id, "wishlist entry removed");
        }
        removed
    }

    /// Issue a fetch of the server wishlist.
    pub fn begin_sync(&mut self) -> FetchTicket {
        self.status.begin(WishlistOp::Fetch);
        self.sync.issue()
    }

    /// Apply the response to a fetch issued by [`Wishlist::begin_sync`].
    pub fn complete_sync(
        &mut self,
        ticket: FetchTicket,
        response: Result<Vec<WishlistEntry>, RemoteError>,
    ) -> Result<SyncOutcome, CommerceError> {
        if !self.sync.is_current(&ticket) {
            tracing::warn!(
                generation = ticket.generation(),
                "discarding superseded wishlist fetch"
            );
            return Ok(SyncOutcome::Superseded);
        }
        let snapshot = match response {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.status.fail(WishlistOp::Fetch, e.clone());
                return Err(e.into());
            }
        };
        let Some(merged) = self.sync.merge(ticket, &self.entries, snapshot) else {
            return Ok(SyncOutcome::Superseded);
        };
        self.entries = merged;
        self.status.succeed();
        tracing::info!(entries = self.entries.len(), "wishlist synced");
        Ok(SyncOutcome::Applied)
    }

    /// Fetch the server wishlist and merge it into local state.
    pub async fn fetch_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
    ) -> Result<SyncOutcome, CommerceError> {
        let ticket = self.begin_sync();
        let response = api.fetch_wishlist(session).await;
        self.complete_sync(ticket, response)
    }

    /// Toggle a product on the server, then locally.
    ///
    /// Returns whether the product is saved afterwards. The server refusing
    /// an add because the product is already saved counts as success.
    pub async fn toggle_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        product_id: ProductId,
    ) -> Result<bool, CommerceError> {
        if self.contains(product_id) {
            self.status.begin(WishlistOp::Remove);
            if let Err(e) = api.remove_wishlist(session, product_id).await {
                self.status.fail(WishlistOp::Remove, e.clone());
                return Err(e.into());
            }
            self.remove(product_id);
            self.status.succeed();
            return Ok(false);
        }

        self.status.begin(WishlistOp::Add);
        match api.add_wishlist(session, product_id).await {
            Ok(entry) => {
                self.insert(entry);
                self.status.succeed();
                tracing::info!(product_id = %product_id, "wishlist entry saved on server");
                Ok(true)
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(product_id = %product_id, "already saved on server, refreshing");
                self.fetch_remote(api, session).await?;
                Ok(self.contains(product_id))
            }
            Err(e) => {
                self.status.fail(WishlistOp::Add, e.clone());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiOp, InMemoryCommerceApi};
    use crate::money::Money;
    use yf_auth::{Credential, User, UserId};

    fn snapshot(id: u64) -> ProductSnapshot {
        ProductSnapshot::new(ProductId::new(id), format!("Product {id}"), Money::from_rupees(1899))
    }

    fn session() -> Session {
        Session::new(User::new(UserId::new(42), "asha@example.com"), Credential::none())
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle_local(snapshot(1));
        let before = wishlist.entries().to_vec();

        assert!(wishlist.toggle_local(snapshot(2)));
        assert!(!wishlist.toggle_local(snapshot(2)));
        assert_eq!(wishlist.entries(), before.as_slice());

        assert!(!wishlist.toggle_local(snapshot(1)));
        assert!(wishlist.toggle_local(snapshot(1)));
        assert_eq!(wishlist.entries(), before.as_slice());
    }

    #[test]
    fn test_set_semantics() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle_local(snapshot(1));
        wishlist.toggle_local(snapshot(2));
        assert_eq!(wishlist.len(), 2);
        assert!(wishlist.contains(ProductId::new(2)));
        wishlist.clear();
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_unsave_survives_stale_fetch() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle_local(snapshot(1));
        let ticket = wishlist.begin_sync();
        wishlist.toggle_local(snapshot(1));

        let stale = vec![WishlistEntry::new(snapshot(1))];
        wishlist.complete_sync(ticket, Ok(stale)).unwrap();
        assert!(!wishlist.contains(ProductId::new(1)));
    }

    #[tokio::test]
    async fn test_toggle_remote_round_trip() {
        let api = InMemoryCommerceApi::new().with_product(ProductId::new(7), "Crystal Butterfly Wall Art", Money::from_rupees(1899));
        let session = session();
        let mut wishlist = Wishlist::new();

        assert!(wishlist.toggle_remote(&api, &session, ProductId::new(7)).await.unwrap());
        assert_eq!(wishlist.entries()[0].product.name, "Crystal Butterfly Wall Art");

        assert!(!wishlist.toggle_remote(&api, &session, ProductId::new(7)).await.unwrap());
        assert!(wishlist.is_empty());
        assert!(api.fetch_wishlist(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_already_saved_on_server_counts_as_saved() {
        let api = InMemoryCommerceApi::new().with_product(ProductId::new(7), "Lamp", Money::from_rupees(999));
        let session = session();
        api.add_wishlist(&session, ProductId::new(7)).await.unwrap();

        let mut wishlist = Wishlist::new();
        assert!(wishlist.toggle_remote(&api, &session, ProductId::new(7)).await.unwrap());
        assert!(wishlist.contains(ProductId::new(7)));
        assert!(wishlist.take_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_entry() {
        let api = InMemoryCommerceApi::new().with_product(ProductId::new(7), "Lamp", Money::from_rupees(999));
        let session = session();
        let mut wishlist = Wishlist::new();
        wishlist.toggle_remote(&api, &session, ProductId::new(7)).await.unwrap();

        api.fail_next(ApiOp::RemoveWishlist, RemoteError::server("boom"));
        assert!(wishlist.toggle_remote(&api, &session, ProductId::new(7)).await.is_err());
        assert!(wishlist.contains(ProductId::new(7)));
        assert_eq!(wishlist.take_error().map(|e| e.message), Some("boom".to_string()));
    }
}
