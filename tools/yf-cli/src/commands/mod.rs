//! CLI command implementations.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod orders;
pub mod wishlist;

use clap::{Args, Subcommand};

/// Arguments for the auth command.
#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Sign in with email and password.
    Login {
        /// Account email.
        email: String,

        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in.
    Register {
        /// Display name.
        #[arg(short, long)]
        name: String,

        /// Account email.
        email: String,

        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the saved session.
    Logout,
    /// Show the signed-in user.
    Whoami,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart with totals.
    Show,
    /// Add a product.
    Add {
        /// Product ID.
        product_id: u64,

        /// Quantity to add.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Set a product's quantity; zero removes it.
    Set {
        /// Product ID.
        product_id: u64,

        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product.
    Remove {
        /// Product ID.
        product_id: u64,
    },
    /// Remove every product.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the wishlist command.
#[derive(Args)]
pub struct WishlistArgs {
    #[command(subcommand)]
    pub command: Option<WishlistCommand>,
}

#[derive(Subcommand)]
pub enum WishlistCommand {
    /// List saved products.
    Show,
    /// Save a product, or unsave it if already saved.
    Toggle {
        /// Product ID.
        product_id: u64,
    },
    /// Add a saved product to the cart and unsave it.
    Move {
        /// Product ID.
        product_id: u64,
    },
}

/// Arguments for the addresses command.
#[derive(Args)]
pub struct AddressesArgs {
    #[command(subcommand)]
    pub command: Option<AddressesCommand>,
}

#[derive(Subcommand)]
pub enum AddressesCommand {
    /// List saved addresses.
    List,
    /// Save a new address.
    Add(NewAddressArgs),
    /// Make a saved address the default.
    SetDefault {
        /// Address ID.
        id: u64,
    },
    /// Delete a saved address.
    Delete {
        /// Address ID.
        id: u64,

        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// A complete address to save.
#[derive(Args)]
pub struct NewAddressArgs {
    /// Recipient name.
    #[arg(long)]
    pub name: String,

    /// 10-digit mobile number.
    #[arg(long)]
    pub phone: String,

    /// House, building and street.
    #[arg(long)]
    pub line1: String,

    /// Area or landmark.
    #[arg(long)]
    pub line2: Option<String>,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    /// 6-digit pincode.
    #[arg(long)]
    pub pincode: String,

    #[arg(long, default_value = "India")]
    pub country: String,

    /// Make this the default address.
    #[arg(long)]
    pub default: bool,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    #[command(subcommand)]
    pub command: CheckoutCommand,
}

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Show what the current cart would cost.
    Quote,
    /// Place an order for the current cart.
    Place(PlaceArgs),
}

/// Arguments for placing an order.
#[derive(Args)]
pub struct PlaceArgs {
    /// Ship to this saved address.
    #[arg(long, conflicts_with_all = ["name", "phone", "line1", "line2", "city", "state", "pincode"])]
    pub address_id: Option<u64>,

    /// Recipient name.
    #[arg(long)]
    pub name: Option<String>,

    /// 10-digit mobile number.
    #[arg(long)]
    pub phone: Option<String>,

    /// House, building and street.
    #[arg(long)]
    pub line1: Option<String>,

    /// Area or landmark.
    #[arg(long)]
    pub line2: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    /// 6-digit pincode.
    #[arg(long)]
    pub pincode: Option<String>,

    /// Payment method: `cod` or `online`.
    #[arg(long, default_value = "cod")]
    pub payment: String,

    /// Resume a failed submission up to this many times.
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

impl PlaceArgs {
    /// Whether any address field was given on the command line.
    pub fn has_address_fields(&self) -> bool {
        [
            &self.name,
            &self.phone,
            &self.line1,
            &self.line2,
            &self.city,
            &self.state,
            &self.pincode,
        ]
        .iter()
        .any(|f| f.is_some())
    }
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: Option<OrdersCommand>,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List recent orders.
    List,
    /// Show the status of an order.
    Track {
        /// Order number, e.g. YFK3J9QZ1A4.
        order_number: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Show where config and session files live.
    Path,
}
