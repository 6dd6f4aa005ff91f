//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Path => show_paths(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    let storefront = &ctx.config.storefront;

    // API section
    ctx.output.blank();
    ctx.output.info("[api]");
    ctx.output.kv("base_url", &storefront.api.base_url);
    ctx.output.kv("records_url", storefront.api.records_url());
    let key = if storefront.api.records_key.is_some() {
        "(set)"
    } else {
        "(not set)"
    };
    ctx.output.kv("records_key", key);
    ctx.output.kv(
        "timeout",
        &format!(
            "connect {}ms, total {}ms",
            storefront.api.timeout.connect.as_millis(),
            storefront.api.timeout.total.as_millis()
        ),
    );
    ctx.output
        .kv("retries", &storefront.api.retry.max_attempts.to_string());

    // Checkout section
    ctx.output.blank();
    ctx.output.info("[checkout]");
    ctx.output.kv(
        "free_delivery_threshold",
        &storefront.checkout.free_delivery_threshold.to_string(),
    );
    ctx.output
        .kv("delivery_charge", &storefront.checkout.delivery_charge.to_string());
    ctx.output
        .kv("mode", &format!("{:?}", storefront.checkout.mode).to_lowercase());
    ctx.output.kv(
        "compensate_partial_failure",
        &storefront.checkout.compensate_partial_failure.to_string(),
    );

    // Catalog section
    ctx.output.blank();
    ctx.output.info("[catalog]");
    ctx.output
        .kv("default_category", &storefront.catalog.default_category);

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.default_config_path();

    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    fs::write(&path, generate_default_config())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    ctx.output
        .success(&format!("Created {}", path.display()));
    Ok(())
}

fn show_paths(ctx: &Context) -> Result<()> {
    let config = ctx
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none, using defaults)".to_string());
    let session = ctx.sessions.path().display().to_string();

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "config": config, "session": session }));
        return Ok(());
    }

    ctx.output.kv("Config", &config);
    ctx.output.kv("Session", &session);
    Ok(())
}
