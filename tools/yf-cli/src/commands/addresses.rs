//! Saved address commands.

use anyhow::{anyhow, Context as _, Result};
use console::style;
use dialoguer::Confirm;
use yf_auth::Session;
use yf_commerce::address::{AddressBook, AddressDraft};
use yf_commerce::ids::AddressId;

use super::{AddressesArgs, AddressesCommand, NewAddressArgs};
use crate::context::Context;

/// Run the addresses command.
pub async fn run(args: AddressesArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let mut book = load_addresses(&session, ctx).await?;

    match args.command {
        Some(AddressesCommand::List) | None => {}
        Some(AddressesCommand::Add(new)) => {
            let saved = book
                .add(&ctx.api, &session, &draft_from(new))
                .await
                .context("Failed to save address")?;
            ctx.output.success(&format!("Saved address {}", saved.id));
        }
        Some(AddressesCommand::SetDefault { id }) => {
            let id = AddressId::new(id);
            let mut draft = book
                .get(id)
                .map(AddressDraft::from)
                .ok_or_else(|| anyhow!("No saved address with ID {}", id))?;
            draft.is_default = true;
            book.update(&ctx.api, &session, id, &draft)
                .await
                .context("Failed to update address")?;
            ctx.output.success(&format!("Address {} is now the default", id));
        }
        Some(AddressesCommand::Delete { id, yes }) => {
            let id = AddressId::new(id);
            let summary = book
                .get(id)
                .map(|a| a.one_line())
                .ok_or_else(|| anyhow!("No saved address with ID {}", id))?;
            if !yes && !ctx.output.is_json() {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {}?", summary))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.info("Cancelled.");
                    return Ok(());
                }
            }
            book.delete(&ctx.api, &session, id)
                .await
                .context("Failed to delete address")?;
            ctx.output.success("Address deleted");
        }
    }

    print_addresses(&book, ctx);
    Ok(())
}

/// Fetch the signed-in user's saved addresses.
pub(crate) async fn load_addresses(session: &Session, ctx: &Context) -> Result<AddressBook> {
    let spinner = ctx.output.spinner("Loading addresses...");
    let mut book = AddressBook::new();
    let result = book.fetch(&ctx.api, session).await.map(|_| ());
    spinner.finish_and_clear();
    result.context("Failed to load addresses")?;
    Ok(book)
}

fn draft_from(args: NewAddressArgs) -> AddressDraft {
    AddressDraft {
        name: args.name,
        phone: args.phone,
        address_line1: args.line1,
        address_line2: args.line2.filter(|s| !s.trim().is_empty()),
        city: args.city,
        state: args.state,
        country: args.country,
        zip_code: args.pincode,
        is_default: args.default,
    }
}

fn print_addresses(book: &AddressBook, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&book.addresses());
        return;
    }

    ctx.output.header("Saved Addresses");

    if book.addresses().is_empty() {
        ctx.output.info("No saved addresses.");
        return;
    }

    for address in book.addresses() {
        let marker = if address.is_default {
            style(" (default)").green().to_string()
        } else {
            String::new()
        };
        ctx.output.list_item(&format!(
            "[{}] {}{}",
            address.id,
            style(&address.name).bold(),
            marker
        ));
        ctx.output.kv("Address", &address.one_line());
        if !address.phone.is_empty() {
            ctx.output.kv("Phone", &address.phone);
        }
    }
}
