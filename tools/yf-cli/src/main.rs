//! YF CLI - Command line client for the YF storefront.
//!
//! Commands:
//! - `yf auth` - Sign in, register and sign out
//! - `yf cart` - Show and edit the server cart
//! - `yf wishlist` - Show and toggle saved products
//! - `yf addresses` - Manage saved shipping addresses
//! - `yf checkout` - Quote and place an order
//! - `yf orders` - List and track recent orders
//! - `yf config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{AddressesArgs, AuthArgs, CartArgs, CheckoutArgs, ConfigArgs, OrdersArgs, WishlistArgs};

/// Log filter variable, e.g. `YF_LOG=yf_commerce=debug`.
const LOG_ENV: &str = "YF_LOG";

/// YF CLI - Shop the YF storefront from the terminal
#[derive(Parser)]
#[command(name = "yf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register or sign out
    Auth(AuthArgs),

    /// Show and edit your cart
    Cart(CartArgs),

    /// Show and toggle saved products
    Wishlist(WishlistArgs),

    /// Manage saved shipping addresses
    Addresses(AddressesArgs),

    /// Quote and place an order
    Checkout(CheckoutArgs),

    /// List and track recent orders
    Orders(OrdersArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.json_logs);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Auth(args) => commands::auth::run(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Wishlist(args) => commands::wishlist::run(args, &ctx).await,
        Commands::Addresses(args) => commands::addresses::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
