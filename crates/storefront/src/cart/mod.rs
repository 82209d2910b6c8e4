//! The cart ledger: bounded line items with durable persistence.
//!
//! The ledger is the source of truth for the cart. Every successful
//! mutation writes the full snapshot to [`storage::CartStorage`]; readers
//! (pricing, checkout, UI) consume [`CartLedger::snapshot`] or
//! [`CartLedger::lines`] and never touch storage themselves.

pub mod storage;

use std::collections::HashSet;

use kirana_core::{Price, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use storage::{CartStorage, CartStorageError};

/// Image URL substituted when the catalog has none for a product.
pub const FALLBACK_IMAGE: &str = "https://via.placeholder.com/150";

/// One product entry in the cart with its aggregated quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    /// Catalog product id; unique within a ledger.
    pub id: ProductId,
    /// Display name, captured at add time.
    pub name: String,
    /// Unit price, captured at add time.
    pub price: Price,
    /// Image URL, never empty (fallback substituted at add time).
    pub image: String,
    /// Aggregated quantity, between 1 and the per-item cap.
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Size caps enforced by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLimits {
    /// Maximum quantity of any single line item.
    pub max_item_quantity: u32,
    /// Maximum number of distinct line items.
    pub max_cart_items: usize,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self {
            max_item_quantity: 10,
            max_cart_items: 100,
        }
    }
}

/// Rejected cart mutations.
///
/// Both variants are advisory: the ledger is left untouched and the caller
/// surfaces the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// The mutation would push a line past the per-item quantity cap.
    #[error("Max quantity of {max} reached.")]
    QuantityLimitExceeded {
        /// The configured cap.
        max: u32,
    },

    /// Adding a new distinct item would exceed the cart-size cap.
    #[error("Cart is full. Cannot add new items.")]
    CartFull {
        /// The configured cap.
        max: usize,
    },
}

/// The cart's source of truth.
///
/// Lines keep insertion order for display determinism. All mutations go
/// through [`add`](Self::add), [`remove`](Self::remove),
/// [`set_quantity`](Self::set_quantity), and [`clear`](Self::clear), each
/// of which persists the snapshot on success.
#[derive(Debug)]
pub struct CartLedger {
    lines: Vec<CartLine>,
    limits: CartLimits,
    storage: CartStorage,
}

impl CartLedger {
    /// Initialize the ledger from persisted storage.
    ///
    /// An absent file is an empty cart; a corrupt or unreadable one
    /// degrades to an empty cart with a warning, never an error.
    #[must_use]
    pub fn load(storage: CartStorage, limits: CartLimits) -> Self {
        let lines = match storage.load() {
            Ok(Some(lines)) => sanitize(lines, limits),
            Ok(None) => {
                debug!(path = %storage.path().display(), "no persisted cart, starting empty");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    path = %storage.path().display(),
                    error = %err,
                    "could not read persisted cart, starting empty"
                );
                Vec::new()
            }
        };

        Self {
            lines,
            limits,
            storage,
        }
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line for this product id, or inserts a new
    /// line with quantity 1. The product's image falls back to
    /// [`FALLBACK_IMAGE`] when the catalog has none.
    ///
    /// # Errors
    ///
    /// [`CartError::QuantityLimitExceeded`] when the increment would pass
    /// the per-item cap, [`CartError::CartFull`] when a new line would pass
    /// the cart-size cap. The ledger is unchanged on error.
    pub fn add(&mut self, product: &Product) -> Result<(), CartError> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == product.id) {
            if line.quantity >= self.limits.max_item_quantity {
                return Err(CartError::QuantityLimitExceeded {
                    max: self.limits.max_item_quantity,
                });
            }
            line.quantity += 1;
            self.persist();
            return Ok(());
        }

        if self.lines.len() >= self.limits.max_cart_items {
            return Err(CartError::CartFull {
                max: self.limits.max_cart_items,
            });
        }

        self.lines.push(CartLine {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product
                .image
                .clone()
                .unwrap_or_else(|| FALLBACK_IMAGE.to_owned()),
            quantity: 1,
        });
        self.persist();
        Ok(())
    }

    /// Delete a line item. Returns whether anything was removed; an absent
    /// id is a no-op, not an error.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != id);
        if self.lines.len() == before {
            return false;
        }

        self.persist();
        true
    }

    /// Overwrite a line's quantity.
    ///
    /// A quantity of 0 behaves as [`remove`](Self::remove). An unknown id
    /// is a no-op. Persists only when something changed.
    ///
    /// # Errors
    ///
    /// [`CartError::QuantityLimitExceeded`] when the quantity passes the
    /// per-item cap; the ledger is unchanged.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove(id);
            return Ok(());
        }

        if quantity > self.limits.max_item_quantity {
            return Err(CartError::QuantityLimitExceeded {
                max: self.limits.max_item_quantity,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| &l.id == id)
            && line.quantity != quantity
        {
            line.quantity = quantity;
            self.persist();
        }
        Ok(())
    }

    /// Empty the ledger and persist the empty snapshot.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    /// Immutable borrow of the current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Defensive copy of the current lines for callers that outlive the
    /// borrow; mutating the returned value never affects the ledger.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// The caps this ledger enforces.
    #[must_use]
    pub const fn limits(&self) -> CartLimits {
        self.limits
    }

    /// Re-persist the current snapshot, surfacing the write error.
    ///
    /// Routine mutations persist automatically (degrading with a log on
    /// failure); this explicit flush is the lifecycle hook that lets a
    /// caller verify durability before shutdown.
    ///
    /// # Errors
    ///
    /// Returns the underlying storage error when the write fails.
    pub fn flush(&self) -> Result<(), CartStorageError> {
        self.storage.save(&self.lines)
    }

    /// Persist after a successful mutation. A write failure is logged and
    /// does not roll back the in-memory state: the ledger stays the source
    /// of truth for the session.
    fn persist(&self) {
        if let Err(err) = self.storage.save(&self.lines) {
            error!(
                path = %self.storage.path().display(),
                error = %err,
                "failed to persist cart"
            );
        }
    }
}

/// Repair a persisted payload that does not satisfy the ledger invariants.
///
/// Hand-edited or stale files can hold zero quantities, duplicate ids,
/// quantities past the cap, or more lines than the cart allows. Each
/// repair is logged; the result always satisfies the invariants.
fn sanitize(lines: Vec<CartLine>, limits: CartLimits) -> Vec<CartLine> {
    let mut seen: HashSet<ProductId> = HashSet::new();
    let mut kept: Vec<CartLine> = Vec::new();

    for mut line in lines {
        if line.quantity == 0 {
            warn!(id = %line.id, "dropping persisted line with zero quantity");
            continue;
        }
        if !seen.insert(line.id.clone()) {
            warn!(id = %line.id, "dropping duplicate persisted line");
            continue;
        }
        if line.quantity > limits.max_item_quantity {
            warn!(
                id = %line.id,
                quantity = line.quantity,
                max = limits.max_item_quantity,
                "clamping persisted quantity to the per-item cap"
            );
            line.quantity = limits.max_item_quantity;
        }
        if kept.len() == limits.max_cart_items {
            warn!(id = %line.id, max = limits.max_cart_items, "dropping persisted line past the cart cap");
            continue;
        }
        kept.push(line);
    }

    kept
}
