//! Server-backed cart operations.

use crate::api::CommerceApi;
use crate::cart::{Cart, CartLineItem, CartOp};
use crate::error::CommerceError;
use crate::ids::{LineItemId, ProductId};
use crate::reconcile::SyncOutcome;
use yf_auth::Session;

impl Cart {
    /// Fetch the server cart and merge it into local state.
    pub async fn fetch_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
    ) -> Result<SyncOutcome, CommerceError> {
        let ticket = self.begin_sync();
        let response = api.fetch_cart(session).await;
        self.complete_sync(ticket, response)
    }

    /// Pull the server cart once a user has signed in.
    pub async fn sync_on_login(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
    ) -> Result<SyncOutcome, CommerceError> {
        tracing::debug!(user_id = %session.user_id(), "syncing cart after sign-in");
        self.fetch_remote(api, session).await
    }

    /// Add a product on the server; the returned line replaces the local one.
    pub async fn add_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<&CartLineItem, CommerceError> {
        self.status_mut().begin(CartOp::Add);
        match api.add_cart_item(session, product_id, quantity.max(1)).await {
            Ok(line) => {
                let id = line.id.clone();
                self.apply_confirmed(line);
                self.status_mut().succeed();
                tracing::info!(line = %id, "cart item saved");
                self.get(&id).ok_or(CommerceError::LineNotSynced(id.clone()))
            }
            Err(e) => {
                self.status_mut().fail(CartOp::Add, e.clone());
                Err(e.into())
            }
        }
    }

    /// Set a line's quantity on the server; zero or less removes it.
    ///
    /// An absent line is a no-op.
    pub async fn update_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        id: &LineItemId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return self.remove_remote(api, session, id).await.map(|_| ());
        }
        let Some(line) = self.get(id) else {
            return Ok(());
        };
        let Some(row) = line.remote_id else {
            return Err(CommerceError::LineNotSynced(id.clone()));
        };
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        self.status_mut().begin(CartOp::Update);
        match api.update_cart_item(session, row, quantity).await {
            Ok(line) => {
                self.apply_confirmed(line);
                self.status_mut().succeed();
                Ok(())
            }
            Err(e) => {
                self.status_mut().fail(CartOp::Update, e.clone());
                Err(e.into())
            }
        }
    }

    /// Delete a line on the server, then locally.
    ///
    /// A line the server never saw is only removed locally.
    pub async fn remove_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
        id: &LineItemId,
    ) -> Result<bool, CommerceError> {
        let Some(row) = self.get(id).map(|l| l.remote_id) else {
            return Ok(false);
        };
        if let Some(row) = row {
            self.status_mut().begin(CartOp::Remove);
            if let Err(e) = api.remove_cart_item(session, row).await {
                self.status_mut().fail(CartOp::Remove, e.clone());
                return Err(e.into());
            }
            self.status_mut().succeed();
        }
        Ok(self.remove_item(id))
    }

    /// Empty the server cart, then the local one.
    pub async fn clear_remote(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
    ) -> Result<(), CommerceError> {
        self.status_mut().begin(CartOp::Clear);
        if let Err(e) = api.clear_cart(session).await {
            self.status_mut().fail(CartOp::Clear, e.clone());
            return Err(e.into());
        }
        self.clear();
        self.status_mut().succeed();
        tracing::info!(user_id = %session.user_id(), "cart cleared on server");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiOp, InMemoryCommerceApi};
    use crate::cart::NewCartItem;
    use crate::error::RemoteError;
    use crate::money::Money;
    use crate::status::RemoteStatus;
    use yf_auth::{Credential, User, UserId};

    fn session() -> Session {
        Session::new(User::new(UserId::new(42), "asha@example.com"), Credential::none())
    }

    fn api() -> InMemoryCommerceApi {
        InMemoryCommerceApi::new()
            .with_product(ProductId::new(1), "Canvas Buddha Painting", Money::from_rupees(2499))
            .with_product(ProductId::new(4), "Brass Diya Set", Money::from_rupees(1299))
    }

    #[tokio::test]
    async fn test_sync_on_login_pulls_server_cart() {
        let api = api();
        let session = session();
        api.seed_cart(session.user_id(), ProductId::new(4), 2);

        let mut cart = Cart::new();
        let outcome = cart.sync_on_login(&api, &session).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Applied);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), Money::from_rupees(2598));
        assert!(cart.items()[0].remote_id.is_some());
    }

    #[tokio::test]
    async fn test_add_remote_replaces_local_line() {
        let api = api();
        let session = session();
        let mut cart = Cart::new();
        cart.add_item(NewCartItem::new(ProductId::new(1), "local name", Money::from_rupees(1)));

        let line = cart.add_remote(&api, &session, ProductId::new(1), 1).await.unwrap();
        assert_eq!(line.name, "Canvas Buddha Painting");
        assert!(line.remote_id.is_some());
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_price(), Money::from_rupees(2499));
    }

    #[tokio::test]
    async fn test_update_and_remove_remote() {
        let api = api();
        let session = session();
        let mut cart = Cart::new();
        cart.add_remote(&api, &session, ProductId::new(4), 1).await.unwrap();
        let id = LineItemId::for_product(ProductId::new(4));

        cart.update_remote(&api, &session, &id, 3).await.unwrap();
        assert_eq!(cart.total_items(), 3);

        cart.update_remote(&api, &session, &id, 0).await.unwrap();
        assert!(cart.is_empty());
        assert!(api.fetch_cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_remote_needs_server_row() {
        let api = api();
        let mut cart = Cart::new();
        cart.add_item(NewCartItem::new(ProductId::new(1), "x", Money::from_rupees(1)));
        let id = LineItemId::for_product(ProductId::new(1));

        let err = cart.update_remote(&api, &session(), &id, 2).await.unwrap_err();
        assert!(matches!(err, CommerceError::LineNotSynced(_)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_local_state() {
        let api = api();
        let session = session();
        let mut cart = Cart::new();
        cart.add_item(NewCartItem::new(ProductId::new(1), "x", Money::from_rupees(10)));
        api.fail_next(ApiOp::AddCartItem, RemoteError::server("boom"));

        let before = cart.state().clone();
        let err = cart.add_remote(&api, &session, ProductId::new(4), 1).await.unwrap_err();

        assert!(matches!(err, CommerceError::Remote(_)));
        assert_eq!(cart.state(), &before);
        assert!(matches!(
            cart.status(),
            RemoteStatus::Failed { op: CartOp::Add, .. }
        ));
    }

    #[tokio::test]
    async fn test_clear_remote_failure_keeps_items() {
        let api = api();
        let session = session();
        let mut cart = Cart::new();
        cart.add_remote(&api, &session, ProductId::new(1), 1).await.unwrap();
        api.fail_next(ApiOp::ClearCart, RemoteError::network("offline"));

        assert!(cart.clear_remote(&api, &session).await.is_err());
        assert_eq!(cart.total_items(), 1);

        cart.clear_remote(&api, &session).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(api.calls(ApiOp::ClearCart), 2);
    }
}
