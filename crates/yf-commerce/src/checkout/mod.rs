//! Checkout module.
//!
//! Contains the checkout state machine, the checkout address form,
//! delivery pricing and order types.

mod address;
mod flow;
mod order;
mod pricing;

pub use address::{AddressField, CheckoutAddress};
pub use flow::{Checkout, CheckoutSettings, CheckoutState, SubmissionMode, SubmissionStep};
pub use order::{NewOrder, Order, OrderLine, OrderNumber, OrderStatus, OrderSummary, PaymentMethod};
pub use pricing::{DeliveryPolicy, OrderTotals};
