//! Product identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog product.
///
/// Product ids are opaque strings assigned by the catalog; the cart treats
/// them purely as equality keys and never inspects their contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id from a catalog string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ProductId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_as_str() {
        let id = ProductId::new("prod-42");
        assert_eq!(id.as_str(), "prod-42");
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(ProductId::new("a"), ProductId::from("a"));
        assert_ne!(ProductId::new("a"), ProductId::new("b"));
    }

    #[test]
    fn test_display() {
        let id = ProductId::new("prod-42");
        assert_eq!(format!("{id}"), "prod-42");
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = ProductId::new("prod-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"prod-42\"");

        let parsed: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_into_inner() {
        let id = ProductId::from(String::from("prod-42"));
        assert_eq!(id.into_inner(), "prod-42");
    }
}
