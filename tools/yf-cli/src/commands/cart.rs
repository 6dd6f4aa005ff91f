//! Cart commands.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use yf_auth::Session;
use yf_commerce::cart::Cart;
use yf_commerce::checkout::DeliveryPolicy;
use yf_commerce::ids::{LineItemId, ProductId};

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::truncate;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let mut cart = load_cart(&session, ctx).await?;

    match args.command {
        Some(CartCommand::Show) | None => {}
        Some(CartCommand::Add {
            product_id,
            quantity,
        }) => {
            let line = cart
                .add_remote(&ctx.api, &session, ProductId::new(product_id), quantity)
                .await
                .context("Failed to add to cart")?;
            ctx.output
                .success(&format!("{} × {} in cart", line.name, line.quantity));
        }
        Some(CartCommand::Set {
            product_id,
            quantity,
        }) => {
            let id = line_for(&cart, product_id)?;
            cart.update_remote(&ctx.api, &session, &id, quantity)
                .await
                .context("Failed to update quantity")?;
            if quantity <= 0 {
                ctx.output.success("Removed from cart");
            } else {
                ctx.output.success(&format!("Quantity set to {}", quantity));
            }
        }
        Some(CartCommand::Remove { product_id }) => {
            let id = line_for(&cart, product_id)?;
            cart.remove_remote(&ctx.api, &session, &id)
                .await
                .context("Failed to remove from cart")?;
            ctx.output.success("Removed from cart");
        }
        Some(CartCommand::Clear { yes }) => {
            if cart.is_empty() {
                ctx.output.info("Your cart is already empty.");
                return Ok(());
            }
            if !yes && !ctx.output.is_json() {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove all {} item(s)?", cart.total_items()))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.info("Cancelled.");
                    return Ok(());
                }
            }
            cart.clear_remote(&ctx.api, &session)
                .await
                .context("Failed to clear cart")?;
            ctx.output.success("Cart cleared");
        }
    }

    print_cart(&cart, &ctx.checkout_settings().delivery, ctx);
    Ok(())
}

/// Fetch the signed-in user's cart.
pub(crate) async fn load_cart(session: &Session, ctx: &Context) -> Result<Cart> {
    let spinner = ctx.output.spinner("Loading cart...");
    let mut cart = Cart::new();
    let result = cart.fetch_remote(&ctx.api, session).await;
    spinner.finish_and_clear();
    result.context("Failed to load cart")?;
    Ok(cart)
}

fn line_for(cart: &Cart, product_id: u64) -> Result<LineItemId> {
    let product_id = ProductId::new(product_id);
    if !cart.contains_product(product_id) {
        bail!("Product {} is not in your cart", product_id);
    }
    Ok(LineItemId::for_product(product_id))
}

pub(crate) fn print_cart(cart: &Cart, delivery: &DeliveryPolicy, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "items": cart.items(),
            "total_items": cart.total_items(),
            "totals": delivery.quote(cart.total_price()),
        }));
        return;
    }

    ctx.output.header("Your Cart");

    if cart.is_empty() {
        ctx.output.info("Your cart is empty.");
        return;
    }

    let widths = [8, 32, 10, 5, 10];
    ctx.output
        .table_row(&["PRODUCT", "NAME", "PRICE", "QTY", "TOTAL"], &widths);
    for line in cart.items() {
        let mut price = line.unit_price.to_string();
        if let Some(original) = line.original_price {
            price = format!("{} (was {}, {}% off)", price, original, line.discount_percent());
        }
        ctx.output.table_row(
            &[
                &line.product_id.to_string(),
                &truncate(&line.name, 32),
                &price,
                &line.quantity.to_string(),
                &line.line_total().to_string(),
            ],
            &widths,
        );
    }

    ctx.output.blank();
    let totals = delivery.quote(cart.total_price());
    ctx.output.totals(&totals);
    if let Some(more) = delivery.amount_to_free_delivery(cart.total_price()) {
        ctx.output
            .info(&format!("Add {} more for FREE delivery", more));
    }
}
