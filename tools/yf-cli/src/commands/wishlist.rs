//! Wishlist commands.

use anyhow::{bail, Context as _, Result};
use yf_commerce::ids::ProductId;
use yf_commerce::wishlist::Wishlist;

use super::cart::load_cart;
use super::{WishlistArgs, WishlistCommand};
use crate::context::Context;
use crate::output::truncate;

/// Run the wishlist command.
pub async fn run(args: WishlistArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;

    let spinner = ctx.output.spinner("Loading wishlist...");
    let mut wishlist = Wishlist::new();
    let result = wishlist.fetch_remote(&ctx.api, &session).await;
    spinner.finish_and_clear();
    result.context("Failed to load wishlist")?;

    match args.command {
        Some(WishlistCommand::Show) | None => {}
        Some(WishlistCommand::Toggle { product_id }) => {
            let product_id = ProductId::new(product_id);
            let saved = wishlist
                .toggle_remote(&ctx.api, &session, product_id)
                .await
                .context("Failed to update wishlist")?;
            if saved {
                ctx.output.success(&format!("Saved product {}", product_id));
            } else {
                ctx.output.success(&format!("Removed product {}", product_id));
            }
        }
        Some(WishlistCommand::Move { product_id }) => {
            let product_id = ProductId::new(product_id);
            if !wishlist.contains(product_id) {
                bail!("Product {} is not in your wishlist", product_id);
            }
            let mut cart = load_cart(&session, ctx).await?;
            let line = cart
                .add_remote(&ctx.api, &session, product_id, 1)
                .await
                .context("Failed to add to cart")?;
            let name = line.name.clone();
            wishlist
                .toggle_remote(&ctx.api, &session, product_id)
                .await
                .context("Added to cart, but failed to remove from wishlist")?;
            ctx.output.success(&format!("Moved {} to your cart", name));
        }
    }

    print_wishlist(&wishlist, ctx);
    Ok(())
}

fn print_wishlist(wishlist: &Wishlist, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&wishlist.entries());
        return;
    }

    ctx.output.header("Wishlist");

    if wishlist.is_empty() {
        ctx.output.info("No saved products.");
        return;
    }

    let widths = [8, 32, 10, 8];
    ctx.output.table_row(&["PRODUCT", "NAME", "PRICE", "OFF"], &widths);
    for entry in wishlist.entries() {
        let product = &entry.product;
        let off = if product.discount_percent > 0 {
            format!("{}%", product.discount_percent)
        } else {
            "-".to_string()
        };
        ctx.output.table_row(
            &[
                &product.id.to_string(),
                &truncate(&product.name, 32),
                &product.sale_price().to_string(),
                &off,
            ],
            &widths,
        );
    }
    ctx.output.blank();
    ctx.output.info(&format!("{} saved product(s)", wishlist.len()));
}
