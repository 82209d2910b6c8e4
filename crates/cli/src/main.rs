//! Kirana CLI - cart management and WhatsApp checkout.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart with totals and reward progress
//! kirana cart show
//!
//! # Add one unit of a product
//! kirana cart add --id chai-250g --name "Masala Chai" --price 120
//!
//! # Change a line item's quantity (0 removes it)
//! kirana cart set-quantity --id chai-250g --quantity 3
//!
//! # Render the order message and WhatsApp links
//! kirana checkout --name "Asha Rao" --mobile 9876543210 \
//!     --house 12/4 --area "Jayanagar 4th Block" --pincode 560041
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and mutate the persisted cart
//! - `checkout` - Validate the address and render the order handoff

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "kirana")]
#[command(author, version, about = "Kirana storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Render the order message and WhatsApp handoff links
    Checkout(commands::checkout::CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with totals and reward progress
    Show,
    /// Add one unit of a product
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Product display name
        #[arg(long)]
        name: String,

        /// Unit price in rupees
        #[arg(long)]
        price: Decimal,

        /// Product image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a line item
    Remove {
        /// Product id
        #[arg(long)]
        id: String,
    },
    /// Set a line item's quantity (0 removes it)
    SetQuantity {
        /// Product id
        #[arg(long)]
        id: String,

        /// New quantity
        #[arg(long)]
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show()?,
            CartAction::Add {
                id,
                name,
                price,
                image,
            } => commands::cart::add(&id, &name, price, image)?,
            CartAction::Remove { id } => commands::cart::remove(&id)?,
            CartAction::SetQuantity { id, quantity } => {
                commands::cart::set_quantity(&id, quantity)?;
            }
            CartAction::Clear => commands::cart::clear()?,
        },
        Commands::Checkout(args) => commands::checkout::run(args).await?,
    }
    Ok(())
}
