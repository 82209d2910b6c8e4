//! Cart management commands.
//!
//! # Usage
//!
//! ```bash
//! kirana cart show
//! kirana cart add --id chai-250g --name "Masala Chai" --price 120
//! kirana cart add --id chai-250g --name "Masala Chai" --price 120 \
//!     --image https://cdn.kirana.example/chai.jpg
//! kirana cart remove --id chai-250g
//! kirana cart set-quantity --id chai-250g --quantity 3
//! kirana cart clear
//! ```
//!
//! Cap violations (per-item quantity, cart size) are advisory: the
//! command reports them and exits cleanly with the cart unchanged.

use kirana_core::{Price, Product, ProductId};
use kirana_storefront::error::AppError;
use rust_decimal::Decimal;

use super::open_state;

/// Show the cart lines, totals, and reward progress.
pub fn show() -> Result<(), AppError> {
    let state = open_state()?;

    if state.ledger().is_empty() {
        tracing::info!("Cart is empty.");
        return Ok(());
    }

    for (index, line) in state.ledger().lines().iter().enumerate() {
        tracing::info!(
            "{}. {} x{} @ {} = {}",
            index + 1,
            line.name,
            line.quantity,
            line.price,
            line.line_subtotal()
        );
    }

    let summary = state.summary();
    tracing::info!("");
    tracing::info!("Subtotal: {}", summary.subtotal);
    if summary.shipping.is_zero() {
        tracing::info!("Shipping: FREE");
    } else {
        tracing::info!("Shipping: {}", summary.shipping);
        tracing::info!(
            "Add {} more for free shipping.",
            summary.free_shipping_remaining
        );
    }
    tracing::info!(
        "Tax ({}%): {}",
        percent(state.config().pricing.tax_rate()),
        summary.tax
    );
    tracing::info!("Total: {}", summary.total);

    if !summary.unlocked_rewards.is_empty() {
        tracing::info!("");
        tracing::info!("Unlocked rewards:");
        for label in &summary.unlocked_rewards {
            tracing::info!("  - {label}");
        }
    }
    if let Some(next) = &summary.next_milestone {
        tracing::info!(
            "Next reward at {}: {} ({} to go, {}% there)",
            next.amount,
            next.label,
            next.remaining,
            percent(summary.milestone_progress)
        );
    }

    Ok(())
}

/// Add one unit of a product to the cart.
pub fn add(id: &str, name: &str, price: Decimal, image: Option<String>) -> Result<(), AppError> {
    let mut state = open_state()?;

    let mut product = Product::new(id, name, Price::new(price));
    if let Some(image) = image {
        product = product.with_image(image);
    }

    match state.ledger_mut().add(&product) {
        Ok(()) => tracing::info!("Added {name} to the cart."),
        Err(err) => tracing::warn!("{err}"),
    }
    Ok(())
}

/// Remove a line item from the cart.
pub fn remove(id: &str) -> Result<(), AppError> {
    let mut state = open_state()?;

    if state.ledger_mut().remove(&ProductId::from(id)) {
        tracing::info!("Removed {id} from the cart.");
    } else {
        tracing::info!("No such item in the cart: {id}");
    }
    Ok(())
}

/// Set a line item's quantity; zero removes it.
pub fn set_quantity(id: &str, quantity: u32) -> Result<(), AppError> {
    let mut state = open_state()?;

    let known = state
        .ledger()
        .lines()
        .iter()
        .any(|line| line.id.as_str() == id);
    if !known {
        tracing::info!("No such item in the cart: {id}");
        return Ok(());
    }

    match state.ledger_mut().set_quantity(&ProductId::from(id), quantity) {
        Ok(()) if quantity == 0 => tracing::info!("Removed {id} from the cart."),
        Ok(()) => tracing::info!("Set {id} to quantity {quantity}."),
        Err(err) => tracing::warn!("{err}"),
    }
    Ok(())
}

/// Empty the cart.
pub fn clear() -> Result<(), AppError> {
    let mut state = open_state()?;
    state.ledger_mut().clear();
    tracing::info!("Cart cleared.");
    Ok(())
}

fn percent(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).normalize()
}
