//! Catalog product read model.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::price::Price;

/// A product as the cart consumes it from the catalog.
///
/// The catalog itself (listing, search, media) lives outside this
/// workspace; the cart only needs the fields that end up on a cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Primary image URL, when the catalog has one.
    pub image: Option<String>,
}

impl Product {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
        }
    }

    /// Attach an image URL.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }
}
