//! Checkout flow state machine.
//!
//! `AddressEntry -> PaymentSelection -> Submitting -> Complete | Failed`.
//! A failed submission keeps its attempt, so placing the order again
//! resumes with the same order number instead of creating a duplicate.

use crate::api::CommerceApi;
use crate::cart::{Cart, CartState};
use crate::checkout::{
    CheckoutAddress, DeliveryPolicy, NewOrder, Order, OrderLine, OrderNumber, OrderStatus,
    OrderSummary, OrderTotals, PaymentMethod,
};
use crate::config::CheckoutConfig;
use crate::error::{CommerceError, RemoteError, ValidationErrors};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use yf_auth::Session;

/// How an order is written to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Order record, then lines, then cart clear, as separate calls.
    #[default]
    Staged,
    /// One call that writes the order and its lines together.
    Atomic,
}

/// Steps of a staged submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStep {
    CreateOrder,
    WriteLines,
    ClearCart,
}

impl SubmissionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStep::CreateOrder => "create order",
            SubmissionStep::WriteLines => "write order lines",
            SubmissionStep::ClearCart => "clear cart",
        }
    }
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the checkout is.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    AddressEntry,
    PaymentSelection,
    Submitting,
    Complete(Order),
    Failed { reason: String },
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::AddressEntry => "address_entry",
            CheckoutState::PaymentSelection => "payment_selection",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Complete(_) => "complete",
            CheckoutState::Failed { .. } => "failed",
        }
    }

    /// The placed order, once complete.
    pub fn order(&self) -> Option<&Order> {
        match self {
            CheckoutState::Complete(order) => Some(order),
            _ => None,
        }
    }
}

/// Checkout behavior taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub delivery: DeliveryPolicy,
    pub mode: SubmissionMode,
    pub compensate_partial_failure: bool,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self::from(&CheckoutConfig::default())
    }
}

impl From<&CheckoutConfig> for CheckoutSettings {
    fn from(config: &CheckoutConfig) -> Self {
        Self {
            delivery: config.delivery_policy(),
            mode: config.mode,
            compensate_partial_failure: config.compensate_partial_failure,
        }
    }
}

/// One logical order placement and how far it got.
#[derive(Debug, Clone)]
struct Attempt {
    order_number: OrderNumber,
    lines: Vec<OrderLine>,
    totals: OrderTotals,
    address: CheckoutAddress,
    payment: PaymentMethod,
    created: Option<OrderSummary>,
    lines_written: bool,
}

impl Attempt {
    fn new_order(&self) -> NewOrder {
        NewOrder {
            order_number: self.order_number.clone(),
            status: OrderStatus::Pending,
            total_amount: self.totals.grand_total,
            shipping_address: self.address.clone(),
            payment_method: self.payment,
        }
    }

    fn to_order(&self, summary: OrderSummary) -> Order {
        Order {
            id: summary.id,
            order_number: self.order_number.clone(),
            status: summary.status,
            totals: self.totals,
            shipping_address: self.address.clone(),
            payment_method: self.payment,
            line_items: self.lines.clone(),
            created_at: summary.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// The checkout state machine.
///
/// Reads the cart when an attempt starts and asks it to clear on success;
/// it never edits cart lines.
#[derive(Debug)]
pub struct Checkout {
    state: CheckoutState,
    address: CheckoutAddress,
    field_errors: ValidationErrors,
    payment: PaymentMethod,
    attempt: Option<Attempt>,
    settings: CheckoutSettings,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new(CheckoutSettings::default())
    }
}

impl Checkout {
    pub fn new(settings: CheckoutSettings) -> Self {
        Self {
            state: CheckoutState::AddressEntry,
            address: CheckoutAddress::default(),
            field_errors: ValidationErrors::new(),
            payment: PaymentMethod::default(),
            attempt: None,
            settings,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn address(&self) -> &CheckoutAddress {
        &self.address
    }

    /// Messages from the last address submission.
    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Order number of the attempt in progress or last failed.
    pub fn pending_order_number(&self) -> Option<&OrderNumber> {
        self.attempt.as_ref().map(|a| &a.order_number)
    }

    /// Totals the shopper would be charged for this cart.
    pub fn quote(&self, cart: &CartState) -> OrderTotals {
        self.settings.delivery.quote(cart.total_price())
    }

    /// Edit the address form.
    pub fn set_address(&mut self, address: CheckoutAddress) -> Result<(), CommerceError> {
        self.require(matches!(self.state, CheckoutState::AddressEntry), "edit address")?;
        self.address = address;
        Ok(())
    }

    /// Validate the address and move on to payment.
    ///
    /// Invalid fields keep the checkout in address entry; the messages are
    /// kept in [`Checkout::field_errors`] and returned.
    pub fn submit_address(&mut self) -> Result<(), CommerceError> {
        self.require(matches!(self.state, CheckoutState::AddressEntry), "submit address")?;
        if let Err(errors) = self.address.validate() {
            tracing::debug!(invalid = errors.len(), "checkout address rejected");
            self.field_errors = errors.clone();
            return Err(CommerceError::Validation(errors));
        }
        self.field_errors = ValidationErrors::new();
        self.address = self.address.normalized();
        self.state = CheckoutState::PaymentSelection;
        Ok(())
    }

    /// Return to the address form.
    ///
    /// From `Failed` this abandons the attempt, which is only allowed when no
    /// order record from it is left on the server.
    pub fn back_to_address(&mut self) -> Result<(), CommerceError> {
        match &self.state {
            CheckoutState::PaymentSelection => {}
            CheckoutState::Failed { .. }
                if self.attempt.as_ref().map_or(true, |a| a.created.is_none()) =>
            {
                self.attempt = None;
            }
            _ => return Err(self.invalid("go back to address")),
        }
        self.state = CheckoutState::AddressEntry;
        Ok(())
    }

    /// Choose how to pay.
    pub fn select_payment(&mut self, method: PaymentMethod) -> Result<(), CommerceError> {
        self.require(
            matches!(self.state, CheckoutState::PaymentSelection),
            "select payment",
        )?;
        if !method.is_enabled() {
            return Err(CommerceError::PaymentMethodUnavailable(method));
        }
        self.payment = method;
        Ok(())
    }

    /// Submit the order.
    ///
    /// On success the cart is cleared locally and on the server, and the
    /// checkout is `Complete`. On failure it is `Failed`, and calling this
    /// again resumes the same attempt. The attempt is held by the checkout
    /// while the calls are in flight, so a dropped future resumes the same
    /// way.
    ///
    /// A resumed attempt whose cart lines changed is repriced when no order
    /// record from it exists yet, and refused with
    /// [`CommerceError::CartChanged`] when one does.
    pub async fn place_order(
        &mut self,
        cart: &mut Cart,
        api: &dyn CommerceApi,
        session: Option<&Session>,
    ) -> Result<Order, CommerceError> {
        self.require(
            matches!(
                self.state,
                CheckoutState::PaymentSelection
                    | CheckoutState::Submitting
                    | CheckoutState::Failed { .. }
            ),
            "place order",
        )?;
        let session = session.ok_or(CommerceError::NotSignedIn)?;
        if !self.payment.is_enabled() {
            return Err(CommerceError::PaymentMethodUnavailable(self.payment));
        }

        let settings = self.settings;
        let lines: Vec<OrderLine> = cart.items().iter().map(OrderLine::from).collect();
        if self.attempt.is_none() && lines.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        let attempt = self.attempt.get_or_insert_with(|| Attempt {
            order_number: OrderNumber::generate(),
            lines: lines.clone(),
            totals: settings.delivery.quote(cart.total_price()),
            address: self.address.clone(),
            payment: self.payment,
            created: None,
            lines_written: false,
        });

        if attempt.lines != lines {
            let refused = if attempt.created.is_some() {
                Some(CommerceError::CartChanged {
                    order_number: attempt.order_number.to_string(),
                })
            } else if lines.is_empty() {
                Some(CommerceError::EmptyCart)
            } else {
                None
            };
            if let Some(e) = refused {
                tracing::warn!(order_number = %attempt.order_number, error = %e, "cart changed since last attempt");
                self.state = CheckoutState::Failed {
                    reason: e.to_string(),
                };
                return Err(e);
            }
            tracing::info!(order_number = %attempt.order_number, "cart changed since last attempt, repricing");
            attempt.totals = settings.delivery.quote(cart.total_price());
            attempt.lines = lines;
        }

        self.state = CheckoutState::Submitting;
        tracing::info!(
            order_number = %attempt.order_number,
            total = %attempt.totals.grand_total,
            mode = ?settings.mode,
            "placing order"
        );

        let outcome = match settings.mode {
            SubmissionMode::Staged => submit_staged(attempt, &settings, cart, api, session).await,
            SubmissionMode::Atomic => submit_atomic(attempt, cart, api, session).await,
        };

        match outcome {
            Ok(summary) => {
                tracing::info!(order_number = %attempt.order_number, order_id = %summary.id, "order placed");
                let order = attempt.to_order(summary);
                self.attempt = None;
                self.state = CheckoutState::Complete(order.clone());
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(order_number = %attempt.order_number, error = %e, "order placement failed");
                self.state = CheckoutState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), CommerceError> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> CommerceError {
        CommerceError::InvalidTransition {
            from: self.state.as_str(),
            action,
        }
    }
}

async fn submit_staged(
    attempt: &mut Attempt,
    settings: &CheckoutSettings,
    cart: &mut Cart,
    api: &dyn CommerceApi,
    session: &Session,
) -> Result<OrderSummary, CommerceError> {
    let summary = match &attempt.created {
        Some(summary) => summary.clone(),
        None => {
            let summary = api.create_order(session, &attempt.new_order()).await?;
            tracing::debug!(order_id = %summary.id, "order record created");
            attempt.created = Some(summary.clone());
            summary
        }
    };

    if !attempt.lines_written {
        if let Err(cause) = api.create_order_items(session, summary.id, &attempt.lines).await {
            return Err(partial(attempt, settings, api, session, SubmissionStep::WriteLines, cause).await);
        }
        attempt.lines_written = true;
    }

    if let Err(cause) = api.clear_cart(session).await {
        return Err(partial(attempt, settings, api, session, SubmissionStep::ClearCart, cause).await);
    }
    cart.clear();
    Ok(summary)
}

async fn submit_atomic(
    attempt: &mut Attempt,
    cart: &mut Cart,
    api: &dyn CommerceApi,
    session: &Session,
) -> Result<OrderSummary, CommerceError> {
    let summary = match &attempt.created {
        Some(summary) => summary.clone(),
        None => {
            let summary = api
                .place_order_atomic(session, &attempt.new_order(), &attempt.lines)
                .await?;
            attempt.created = Some(summary.clone());
            attempt.lines_written = true;
            summary
        }
    };

    // The order is committed; a stale server cart is not worth failing it over.
    if let Err(e) = api.clear_cart(session).await {
        tracing::warn!(order_id = %summary.id, error = %e, "order placed but server cart not cleared");
    }
    cart.clear();
    Ok(summary)
}

/// Report a failure after the order record exists, deleting it first if configured.
async fn partial(
    attempt: &mut Attempt,
    settings: &CheckoutSettings,
    api: &dyn CommerceApi,
    session: &Session,
    step: SubmissionStep,
    cause: RemoteError,
) -> CommerceError {
    let mut compensated = false;
    if settings.compensate_partial_failure {
        if let Some(order_id) = attempt.created.as_ref().map(|c| c.id) {
            match api.delete_order(session, order_id).await {
                Ok(()) => {
                    tracing::info!(%order_id, "deleted partially submitted order");
                    attempt.created = None;
                    attempt.lines_written = false;
                    compensated = true;
                }
                Err(e) => {
                    tracing::warn!(%order_id, error = %e, "could not delete partially submitted order");
                }
            }
        }
    }
    CommerceError::PartialSubmission {
        order_number: attempt.order_number.to_string(),
        step,
        compensated,
        cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiOp, InMemoryCommerceApi};
    use crate::cart::NewCartItem;
    use crate::ids::ProductId;
    use crate::money::Money;
    use std::time::Duration;
    use yf_auth::{Credential, User, UserId};

    const USER: UserId = UserId::new(7);

    fn session() -> Session {
        Session::new(User::new(USER, "ravi@example.com"), Credential::none())
    }

    fn address() -> CheckoutAddress {
        CheckoutAddress {
            full_name: "Ravi Kumar".into(),
            phone: "9876543210".into(),
            address_line1: "4 Park Street".into(),
            address_line2: None,
            city: "Kolkata".into(),
            state: "West Bengal".into(),
            pincode: "700016".into(),
        }
    }

    fn settings(mode: SubmissionMode, compensate: bool) -> CheckoutSettings {
        CheckoutSettings {
            delivery: DeliveryPolicy::default(),
            mode,
            compensate_partial_failure: compensate,
        }
    }

    /// Server and local cart holding p1 x1 at 2499 and p4 x2 at 1299.
    async fn synced_cart(api: &InMemoryCommerceApi, session: &Session) -> Cart {
        api.seed_cart(USER, ProductId::new(1), 1);
        api.seed_cart(USER, ProductId::new(4), 2);
        let mut cart = Cart::new();
        cart.fetch_remote(api, session).await.unwrap();
        cart
    }

    fn api() -> InMemoryCommerceApi {
        InMemoryCommerceApi::new()
            .with_product(ProductId::new(1), "Kurta", Money::from_rupees(2499))
            .with_product(ProductId::new(4), "Lamp", Money::from_rupees(1299))
    }

    fn ready(settings: CheckoutSettings) -> Checkout {
        let mut checkout = Checkout::new(settings);
        checkout.set_address(address()).unwrap();
        checkout.submit_address().unwrap();
        checkout
    }

    #[test]
    fn test_invalid_address_stays_in_address_entry() {
        let mut checkout = Checkout::default();
        checkout
            .set_address(CheckoutAddress { phone: "12345".into(), ..address() })
            .unwrap();
        let err = checkout.submit_address().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(checkout.state(), &CheckoutState::AddressEntry);
        assert_eq!(checkout.field_errors().len(), 1);

        checkout.set_address(address()).unwrap();
        checkout.submit_address().unwrap();
        assert_eq!(checkout.state(), &CheckoutState::PaymentSelection);
        assert!(checkout.field_errors().is_empty());
    }

    #[test]
    fn test_payment_selection_and_back() {
        let mut checkout = ready(CheckoutSettings::default());
        assert_eq!(
            checkout.select_payment(PaymentMethod::Online),
            Err(CommerceError::PaymentMethodUnavailable(PaymentMethod::Online))
        );
        checkout.select_payment(PaymentMethod::CashOnDelivery).unwrap();

        checkout.back_to_address().unwrap();
        assert_eq!(checkout.state(), &CheckoutState::AddressEntry);
        assert!(matches!(
            checkout.select_payment(PaymentMethod::CashOnDelivery),
            Err(CommerceError::InvalidTransition { from: "address_entry", .. })
        ));
    }

    #[tokio::test]
    async fn test_place_order_guards() {
        let api = api();
        let session = session();
        let mut cart = Cart::new();

        let mut checkout = Checkout::default();
        assert!(matches!(
            checkout.place_order(&mut cart, &api, Some(&session)).await,
            Err(CommerceError::InvalidTransition { .. })
        ));

        let mut checkout = ready(CheckoutSettings::default());
        assert_eq!(
            checkout.place_order(&mut cart, &api, None).await.unwrap_err(),
            CommerceError::NotSignedIn
        );
        assert_eq!(
            checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap_err(),
            CommerceError::EmptyCart
        );
        assert_eq!(checkout.state(), &CheckoutState::PaymentSelection);
        assert_eq!(api.calls(ApiOp::CreateOrder), 0);
    }

    #[tokio::test]
    async fn test_staged_order_completes_and_clears_cart() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        assert_eq!(cart.total_price(), Money::from_rupees(5097));

        let mut checkout = ready(settings(SubmissionMode::Staged, true));
        let order = checkout
            .place_order(&mut cart, &api, Some(&session))
            .await
            .unwrap();

        assert_eq!(order.totals.delivery_charge, Money::ZERO);
        assert_eq!(order.total_amount(), Money::from_rupees(5097));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.item_count(), 3);
        assert!(OrderNumber::is_valid(order.order_number.as_str()));
        assert!(matches!(checkout.state(), CheckoutState::Complete(_)));

        assert!(cart.is_empty());
        assert!(api.fetch_cart(&session).await.unwrap().is_empty());
        let stored = api.orders(USER);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].total_amount, Money::from_rupees(5097));
        assert_eq!(api.order_items(order.id).len(), 2);
    }

    #[tokio::test]
    async fn test_delivery_charge_added_below_threshold() {
        let api = InMemoryCommerceApi::new().with_product(ProductId::new(9), "Mug", Money::from_rupees(500));
        let session = session();
        api.seed_cart(USER, ProductId::new(9), 1);
        let mut cart = Cart::new();
        cart.fetch_remote(&api, &session).await.unwrap();

        let mut checkout = ready(CheckoutSettings::default());
        let order = checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap();
        assert_eq!(order.totals.delivery_charge, Money::from_rupees(99));
        assert_eq!(order.total_amount(), Money::from_rupees(599));
    }

    #[tokio::test]
    async fn test_items_step_failure_without_compensation_leaves_pending_order() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Staged, false));

        api.fail_next(ApiOp::CreateOrderItems, RemoteError::server("insert failed"));
        let err = checkout
            .place_order(&mut cart, &api, Some(&session))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CommerceError::PartialSubmission {
                step: SubmissionStep::WriteLines,
                compensated: false,
                ..
            }
        ));
        assert!(matches!(checkout.state(), CheckoutState::Failed { .. }));
        let stored = api.orders(USER);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, OrderStatus::Pending);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(api.fetch_cart(&session).await.unwrap().len(), 2);
        assert_eq!(api.calls(ApiOp::DeleteOrder), 0);
    }

    #[tokio::test]
    async fn test_retry_resumes_same_attempt() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Staged, false));

        api.fail_next(ApiOp::CreateOrderItems, RemoteError::network("offline"));
        checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap_err();
        let number = checkout.pending_order_number().cloned().unwrap();
        assert!(checkout.back_to_address().is_err());

        let order = checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap();
        assert_eq!(order.order_number, number);
        assert_eq!(api.calls(ApiOp::CreateOrder), 1);
        assert_eq!(api.orders(USER).len(), 1);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_submission_keeps_its_order_number() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Staged, false));

        api.stall_next(ApiOp::CreateOrderItems);
        let dropped = tokio::time::timeout(
            Duration::from_millis(50),
            checkout.place_order(&mut cart, &api, Some(&session)),
        )
        .await;
        assert!(dropped.is_err());
        assert_eq!(checkout.state(), &CheckoutState::Submitting);
        let number = checkout.pending_order_number().cloned().unwrap();
        assert_eq!(api.orders(USER).len(), 1);

        let order = checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap();
        assert_eq!(order.order_number, number);
        assert_eq!(api.calls(ApiOp::CreateOrder), 1);
        assert_eq!(api.orders(USER).len(), 1);
        assert_eq!(api.order_items(order.id).len(), 2);
        assert!(checkout.pending_order_number().is_none());
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_retry_refuses_changed_cart_once_order_exists() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Staged, false));

        api.fail_next(ApiOp::CreateOrderItems, RemoteError::server("insert failed"));
        checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap_err();
        let number = checkout.pending_order_number().cloned().unwrap();

        cart.add_item(NewCartItem::new(ProductId::new(9), "Mug", Money::from_rupees(500)));
        let err = checkout
            .place_order(&mut cart, &api, Some(&session))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CommerceError::CartChanged {
                order_number: number.to_string()
            }
        );
        assert!(matches!(checkout.state(), CheckoutState::Failed { .. }));
        assert_eq!(checkout.pending_order_number(), Some(&number));
        assert_eq!(api.calls(ApiOp::CreateOrderItems), 1);
        assert_eq!(api.orders(USER).len(), 1);
        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.total_items(), 4);
        assert_eq!(api.fetch_cart(&session).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_reprices_changed_cart_after_compensation() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Staged, true));

        api.fail_next(ApiOp::ClearCart, RemoteError::server("busy"));
        checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap_err();
        let number = checkout.pending_order_number().cloned().unwrap();
        assert!(api.orders(USER).is_empty());

        cart.add_item(NewCartItem::new(ProductId::new(9), "Mug", Money::from_rupees(500)));
        let order = checkout.place_order(&mut cart, &api, Some(&session)).await.unwrap();

        assert_eq!(order.order_number, number);
        assert_eq!(order.line_items.len(), 3);
        assert_eq!(order.total_amount(), Money::from_rupees(5597));
        let stored = api.orders(USER);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].total_amount, Money::from_rupees(5597));
        assert_eq!(api.order_items(order.id).len(), 3);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_compensation_deletes_created_order() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Staged, true));

        api.fail_next(ApiOp::ClearCart, RemoteError::server("busy"));
        let err = checkout
            .place_order(&mut cart, &api, Some(&session))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CommerceError::PartialSubmission {
                step: SubmissionStep::ClearCart,
                compensated: true,
                ..
            }
        ));
        assert!(api.orders(USER).is_empty());
        assert_eq!(cart.total_items(), 3);

        // Nothing is left on the server, so the shopper may start over.
        checkout.back_to_address().unwrap();
        assert!(checkout.pending_order_number().is_none());
    }

    #[tokio::test]
    async fn test_create_failure_is_plain_remote_error() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(CheckoutSettings::default());

        api.fail_next(ApiOp::CreateOrder, RemoteError::network("offline"));
        let err = checkout
            .place_order(&mut cart, &api, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Remote(_)));
        assert!(api.orders(USER).is_empty());
        assert!(matches!(checkout.state(), CheckoutState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_atomic_mode_single_call() {
        let api = api();
        let session = session();
        let mut cart = synced_cart(&api, &session).await;
        let mut checkout = ready(settings(SubmissionMode::Atomic, true));

        let order = checkout
            .place_order(&mut cart, &api, Some(&session))
            .await
            .unwrap();
        assert_eq!(api.calls(ApiOp::PlaceOrderAtomic), 1);
        assert_eq!(api.calls(ApiOp::CreateOrder), 0);
        assert_eq!(api.order_items(order.id).len(), 2);
        assert!(cart.is_empty());
    }
}
