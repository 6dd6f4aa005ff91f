//! Sign-in commands.

use anyhow::{Context as _, Result};
use dialoguer::Password;
use yf_auth::Session;
use yf_commerce::cart::Cart;

use super::{AuthArgs, AuthCommand};
use crate::context::Context;

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { email, password } => login(&email, password, ctx).await,
        AuthCommand::Register {
            name,
            email,
            password,
        } => register(&name, &email, password, ctx).await,
        AuthCommand::Logout => logout(ctx),
        AuthCommand::Whoami => whoami(ctx),
    }
}

fn read_password(given: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let prompt = Password::new().with_prompt("Password");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm password", "Passwords do not match")
    } else {
        prompt
    };
    prompt.interact().context("Failed to read password")
}

async fn login(email: &str, password: Option<String>, ctx: &Context) -> Result<()> {
    let password = read_password(password, false)?;

    let spinner = ctx.output.spinner("Signing in...");
    let result = ctx.auth.login(email, &password).await;
    spinner.finish_and_clear();
    let session = result.context("Sign in failed")?;

    finish_sign_in(&session, ctx).await
}

async fn register(name: &str, email: &str, password: Option<String>, ctx: &Context) -> Result<()> {
    let password = read_password(password, true)?;

    let spinner = ctx.output.spinner("Creating account...");
    let result = ctx.auth.register(name, email, &password).await;
    spinner.finish_and_clear();
    let session = result.context("Registration failed")?;

    finish_sign_in(&session, ctx).await
}

/// Save the session and pull the server cart for it.
async fn finish_sign_in(session: &Session, ctx: &Context) -> Result<()> {
    ctx.sessions
        .save(session)
        .context("Failed to save session")?;

    if !session.credential.is_present() {
        ctx.output
            .warn("The server returned no token; requests will be sent unauthenticated.");
    }

    let mut cart = Cart::new();
    if let Err(e) = cart.sync_on_login(&ctx.api, session).await {
        ctx.output.warn(&format!("Could not load your cart: {}", e));
    }

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "user": session.user,
            "cart_items": cart.total_items(),
        }));
        return Ok(());
    }

    ctx.output.success(&format!(
        "Signed in as {} ({})",
        session.user.display_name(),
        session.user.email
    ));
    if !cart.is_empty() {
        ctx.output.info(&format!(
            "{} item(s) in your cart, {}",
            cart.total_items(),
            cart.total_price()
        ));
    }
    ctx.output.debug(&format!("Session saved to {}", ctx.sessions.path().display()));

    Ok(())
}

fn logout(ctx: &Context) -> Result<()> {
    ctx.sessions.clear().context("Failed to remove session")?;
    ctx.output.success("Signed out");
    Ok(())
}

fn whoami(ctx: &Context) -> Result<()> {
    let Some(session) = ctx.current_session()? else {
        ctx.output.info("Not signed in.");
        return Ok(());
    };

    if ctx.output.is_json() {
        ctx.output.json(&session.user);
        return Ok(());
    }

    ctx.output.header("Signed in");
    ctx.output.kv("Name", session.user.display_name());
    ctx.output.kv("Email", &session.user.email);
    ctx.output.kv("User ID", &session.user.id.to_string());
    ctx.output.kv("Role", session.user.role.as_str());
    ctx.output.kv(
        "Expires",
        &session.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    Ok(())
}
