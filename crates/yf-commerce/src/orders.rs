//! Read-only order history.

use crate::api::CommerceApi;
use crate::checkout::OrderSummary;
use crate::error::{CommerceError, RemoteError};
use crate::status::RemoteStatus;
use std::cmp::Reverse;
use yf_auth::Session;

/// How many recent orders are listed.
pub const HISTORY_LIMIT: usize = 10;

/// Remote operations the order history performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryOp {
    Fetch,
}

/// The signed-in user's recent orders, newest first.
#[derive(Debug, Default)]
pub struct OrderHistory {
    orders: Vec<OrderSummary>,
    status: RemoteStatus<HistoryOp>,
}

impl OrderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[OrderSummary] {
        &self.orders
    }

    pub fn status(&self) -> &RemoteStatus<HistoryOp> {
        &self.status
    }

    /// The recorded remote error, handed out once.
    pub fn take_error(&mut self) -> Option<RemoteError> {
        self.status.take_error()
    }

    /// Look up a listed order by its number.
    pub fn find(&self, order_number: &str) -> Option<&OrderSummary> {
        let wanted = order_number.trim();
        self.orders
            .iter()
            .find(|o| o.order_number.as_str().eq_ignore_ascii_case(wanted))
    }

    /// Reload the most recent orders.
    pub async fn fetch(
        &mut self,
        api: &dyn CommerceApi,
        session: &Session,
    ) -> Result<&[OrderSummary], CommerceError> {
        self.status.begin(HistoryOp::Fetch);
        match api.list_orders(session, HISTORY_LIMIT).await {
            Ok(mut orders) => {
                orders.sort_by_key(|o| Reverse(o.created_at));
                orders.truncate(HISTORY_LIMIT);
                self.orders = orders;
                self.status.succeed();
                tracing::debug!(count = self.orders.len(), "order history fetched");
                Ok(&self.orders)
            }
            Err(e) => {
                self.status.fail(HistoryOp::Fetch, e.clone());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiOp, InMemoryCommerceApi};
    use crate::checkout::{CheckoutAddress, NewOrder, OrderNumber, OrderStatus, PaymentMethod};
    use crate::money::Money;
    use yf_auth::{Credential, User, UserId};

    fn session() -> Session {
        Session::new(User::new(UserId::new(3), "meera@example.com"), Credential::none())
    }

    fn new_order(rupees: i64) -> NewOrder {
        NewOrder {
            order_number: OrderNumber::generate(),
            status: OrderStatus::Pending,
            total_amount: Money::from_rupees(rupees),
            shipping_address: CheckoutAddress::default(),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[tokio::test]
    async fn test_fetch_lists_newest_first_and_limits() {
        let api = InMemoryCommerceApi::new();
        let session = session();
        for i in 0..12 {
            api.create_order(&session, &new_order(100 + i)).await.unwrap();
        }

        let mut history = OrderHistory::new();
        let orders = history.fetch(&api, &session).await.unwrap();
        assert_eq!(orders.len(), HISTORY_LIMIT);
        assert_eq!(orders[0].total_amount, Money::from_rupees(111));
    }

    #[tokio::test]
    async fn test_find_by_order_number() {
        let api = InMemoryCommerceApi::new();
        let session = session();
        let placed = api.create_order(&session, &new_order(599)).await.unwrap();

        let mut history = OrderHistory::new();
        history.fetch(&api, &session).await.unwrap();
        let lowercase = placed.order_number.as_str().to_ascii_lowercase();
        assert_eq!(history.find(&lowercase).map(|o| o.id), Some(placed.id));
        assert!(history.find("YF000").is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_list() {
        let api = InMemoryCommerceApi::new();
        let session = session();
        api.create_order(&session, &new_order(599)).await.unwrap();
        let mut history = OrderHistory::new();
        history.fetch(&api, &session).await.unwrap();

        api.fail_next(ApiOp::ListOrders, RemoteError::network("offline"));
        assert!(history.fetch(&api, &session).await.is_err());
        assert_eq!(history.orders().len(), 1);
        assert_eq!(history.take_error().map(|e| e.message), Some("offline".to_string()));
    }
}
