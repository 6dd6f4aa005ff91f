//! Order history commands.

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Local, Utc};
use yf_commerce::checkout::{OrderNumber, OrderStatus};
use yf_commerce::orders::OrderHistory;

use super::{OrdersArgs, OrdersCommand};
use crate::context::Context;
use crate::output::status_badge;

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;

    let spinner = ctx.output.spinner("Loading orders...");
    let mut history = OrderHistory::new();
    let result = history.fetch(&ctx.api, &session).await.map(|_| ());
    spinner.finish_and_clear();
    result.context("Failed to load orders")?;

    match args.command {
        Some(OrdersCommand::List) | None => list_orders(&history, ctx),
        Some(OrdersCommand::Track { order_number }) => track_order(&order_number, &history, ctx),
    }
}

fn list_orders(history: &OrderHistory, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&history.orders());
        return Ok(());
    }

    ctx.output.header("Recent Orders");

    if history.orders().is_empty() {
        ctx.output.info("No orders yet.");
        return Ok(());
    }

    let widths = [16, 18, 12, 12];
    ctx.output
        .table_row(&["ORDER", "PLACED", "TOTAL", "STATUS"], &widths);
    for order in history.orders() {
        ctx.output.table_row(
            &[
                order.order_number.as_str(),
                &format_placed(order.created_at),
                &order.total_amount.to_string(),
                &status_badge(order.status),
            ],
            &widths,
        );
    }
    Ok(())
}

fn track_order(order_number: &str, history: &OrderHistory, ctx: &Context) -> Result<()> {
    let wanted = order_number.trim().to_ascii_uppercase();
    if !OrderNumber::is_valid(&wanted) {
        bail!("'{}' is not an order number (expected YF followed by letters and digits)", order_number);
    }
    let Some(order) = history.find(&wanted) else {
        bail!("Order {} not found among your recent orders", wanted);
    };

    if ctx.output.is_json() {
        ctx.output.json(order);
        return Ok(());
    }

    ctx.output.header(&format!("Order {}", order.order_number));
    ctx.output.kv("Status", &status_badge(order.status));
    ctx.output.kv("Placed", &format_placed(order.created_at));
    ctx.output.kv("Total", &order.total_amount.to_string());
    ctx.output.blank();
    ctx.output.info(progress_note(order.status));
    Ok(())
}

fn progress_note(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Your order has been received and is being prepared.",
        OrderStatus::Shipped => "Your order is on its way.",
        OrderStatus::Delivered => "Your order has been delivered.",
        OrderStatus::Cancelled => "This order was cancelled.",
    }
}

fn format_placed(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .map(|t| t.with_timezone(&Local).format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_placed() {
        assert_eq!(format_placed(None), "-");
        let placed = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        assert!(format_placed(Some(placed)).contains("2026"));
    }

    #[test]
    fn test_every_status_has_a_note() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!progress_note(status).is_empty());
        }
    }
}
