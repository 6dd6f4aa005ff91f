//! Checkout commands.

use anyhow::{anyhow, bail, Context as _, Result};
use dialoguer::Confirm;
use yf_auth::Session;
use yf_commerce::checkout::{Checkout, CheckoutAddress, Order, PaymentMethod};
use yf_commerce::error::RemoteErrorKind;
use yf_commerce::ids::AddressId;
use yf_commerce::CommerceError;

use super::addresses::load_addresses;
use super::cart::load_cart;
use super::{CheckoutArgs, CheckoutCommand, PlaceArgs};
use crate::context::Context;
use crate::output::truncate;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CheckoutCommand::Quote => quote(ctx).await,
        CheckoutCommand::Place(args) => place(args, ctx).await,
    }
}

async fn quote(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let cart = load_cart(&session, ctx).await?;
    let checkout = Checkout::new(ctx.checkout_settings());
    let totals = checkout.quote(cart.state());

    if ctx.output.is_json() {
        ctx.output.json(&totals);
        return Ok(());
    }

    ctx.output.header("Order Summary");
    if cart.is_empty() {
        ctx.output.info("Your cart is empty.");
        return Ok(());
    }
    ctx.output.kv("Items", &cart.total_items().to_string());
    ctx.output.totals(&totals);
    if let Some(more) = checkout
        .settings()
        .delivery
        .amount_to_free_delivery(totals.subtotal)
    {
        ctx.output
            .info(&format!("Add {} more for FREE delivery", more));
    }
    Ok(())
}

async fn place(args: PlaceArgs, ctx: &Context) -> Result<()> {
    let payment = parse_payment(&args.payment)?;
    let session = ctx.session()?;
    let mut cart = load_cart(&session, ctx).await?;
    if cart.is_empty() {
        bail!("Your cart is empty");
    }
    let address = resolve_address(&args, &session, ctx).await?;

    let mut checkout = Checkout::new(ctx.checkout_settings());
    checkout.set_address(address)?;
    if let Err(e) = checkout.submit_address() {
        if e.is_validation() {
            for field in checkout.field_errors().iter() {
                ctx.output.warn(&format!("{}: {}", field.field, field.message));
            }
            bail!("The shipping address is incomplete");
        }
        return Err(e.into());
    }
    checkout.select_payment(payment)?;

    let totals = checkout.quote(cart.state());
    if !ctx.output.is_json() {
        ctx.output.header("Placing Order");
        ctx.output.kv("Ship to", &ship_to(checkout.address()));
        ctx.output.kv("Payment", payment.label());
        ctx.output.kv("Items", &cart.total_items().to_string());
        ctx.output.totals(&totals);
        ctx.output.blank();
    }

    if !args.yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Place order for {}?", totals.grand_total))
            .default(true)
            .interact()?;
        if !confirmed {
            ctx.output.info("Cancelled.");
            return Ok(());
        }
    }

    let mut retries_left = args.retries;
    loop {
        let spinner = ctx.output.spinner("Placing order...");
        let result = checkout
            .place_order(&mut cart, &ctx.api, Some(&session))
            .await;
        spinner.finish_and_clear();

        match result {
            Ok(order) => {
                print_order(&order, ctx);
                return Ok(());
            }
            Err(e) if retries_left > 0 && is_resumable(&e) => {
                retries_left -= 1;
                let number = checkout
                    .pending_order_number()
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                ctx.output
                    .warn(&format!("{}; resuming order {}", e, number));
            }
            Err(e) => return Err(explain(e)),
        }
    }
}

fn parse_payment(value: &str) -> Result<PaymentMethod> {
    PaymentMethod::ALL
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| anyhow!("Unknown payment method '{}', expected `cod` or `online`", value))
}

/// The address from flags, a saved address ID, or the saved default.
async fn resolve_address(
    args: &PlaceArgs,
    session: &Session,
    ctx: &Context,
) -> Result<CheckoutAddress> {
    if args.has_address_fields() {
        return Ok(CheckoutAddress {
            full_name: args.name.clone().unwrap_or_default(),
            phone: args.phone.clone().unwrap_or_default(),
            address_line1: args.line1.clone().unwrap_or_default(),
            address_line2: args.line2.clone(),
            city: args.city.clone().unwrap_or_default(),
            state: args.state.clone().unwrap_or_default(),
            pincode: args.pincode.clone().unwrap_or_default(),
        });
    }

    let book = load_addresses(session, ctx).await?;
    let saved = match args.address_id {
        Some(id) => book
            .get(AddressId::new(id))
            .ok_or_else(|| anyhow!("No saved address with ID {}", id))?,
        None => book.default_address().ok_or_else(|| {
            anyhow!("No default address. Pass --address-id or the address fields (--name, --phone, ...)")
        })?,
    };
    ctx.output.debug(&format!("Shipping to saved address {}", saved.id));
    Ok(CheckoutAddress::from(saved))
}

/// Whether placing the order again continues the same attempt usefully.
fn is_resumable(e: &CommerceError) -> bool {
    match e.remote() {
        Some(remote) => !matches!(
            remote.kind,
            RemoteErrorKind::Unauthorized | RemoteErrorKind::Rejected
        ),
        None => false,
    }
}

fn explain(e: CommerceError) -> anyhow::Error {
    match &e {
        CommerceError::PartialSubmission {
            order_number,
            compensated: false,
            ..
        } => anyhow!(e.to_string()).context(format!(
            "Order {} was created but is incomplete; contact support before ordering again",
            order_number
        )),
        CommerceError::PartialSubmission {
            compensated: true, ..
        } => anyhow!(e.to_string())
            .context("Order could not be completed and was withdrawn; your cart is unchanged"),
        CommerceError::CartChanged { order_number } => anyhow!(e.to_string()).context(format!(
            "Order {} no longer matches your cart; contact support before ordering again",
            order_number
        )),
        _ => anyhow::Error::new(e).context("Failed to place order"),
    }
}

fn ship_to(address: &CheckoutAddress) -> String {
    let mut parts = vec![address.full_name.as_str(), address.address_line1.as_str()];
    if let Some(line2) = address.address_line2.as_deref() {
        parts.push(line2);
    }
    parts.extend([address.city.as_str(), address.state.as_str(), address.pincode.as_str()]);
    parts.join(", ")
}

fn print_order(order: &Order, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(order);
        return;
    }

    ctx.output
        .success(&format!("Order {} placed", order.order_number));
    ctx.output.blank();
    for line in &order.line_items {
        ctx.output.list_item(&format!(
            "{} × {}  {}",
            truncate(&line.product_name, 40),
            line.quantity,
            line.line_total()
        ));
    }
    ctx.output.blank();
    ctx.output.totals(&order.totals);
    ctx.output.kv("Payment", order.payment_method.label());
    ctx.output.kv("Status", order.status.display_name());
    ctx.output.blank();
    ctx.output.info(&format!(
        "Track it with `yf orders track {}`",
        order.order_number
    ));
}
