//! Integration tests for Kirana.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kirana-integration-tests
//! ```
//!
//! No test here touches the network or the real India Post API: postal
//! lookups run against [`ScriptedResolver`], and every cart persists into
//! a per-test temporary directory.
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart durability and storage repair
//! - `checkout_flow` - Cart to WhatsApp handoff, end to end
//! - `address_resolution` - Debounced pincode lookup behavior

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kirana_core::{Pincode, Price, Product};
use kirana_storefront::address::postal::{PostalAddress, PostalLookupError, PostalResolver};
use kirana_storefront::cart::CartLimits;
use kirana_storefront::config::StorefrontConfig;
use kirana_storefront::pricing::PricingConfig;

/// A config rooted in a temporary data directory, with default limits
/// and pricing. The postal API URL is inert; tests use scripted
/// resolvers.
#[must_use]
pub fn test_config(data_dir: &Path) -> StorefrontConfig {
    StorefrontConfig {
        base_url: "https://kirana.example".to_owned(),
        contact_phone: "919876543210".to_owned(),
        data_dir: data_dir.to_path_buf(),
        pincode_api_url: "https://postal.invalid/pincode".to_owned(),
        limits: CartLimits::default(),
        pricing: PricingConfig::default(),
    }
}

/// A small catalog to exercise carts with.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new("chai-250g", "Masala Chai", Price::from_rupees(120)),
        Product::new("jaggery-500g", "Organic Jaggery", Price::from_rupees(65)),
        Product::new("ghee-1l", "Desi Ghee", Price::from_rupees(1200))
            .with_image("https://cdn.kirana.example/ghee.jpg"),
    ]
}

/// Postal resolver scripted per pincode, recording every lookup.
///
/// Pincodes without an entry resolve to "no records", the same answer
/// the real API gives for an unknown pincode.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    entries: Arc<HashMap<String, (String, String)>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    /// Build a resolver from `(pincode, city, state)` entries.
    #[must_use]
    pub fn new(entries: &[(&str, &str, &str)]) -> Self {
        Self {
            entries: Arc::new(
                entries
                    .iter()
                    .map(|(pin, city, state)| {
                        ((*pin).to_owned(), ((*city).to_owned(), (*state).to_owned()))
                    })
                    .collect(),
            ),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every pincode that was looked up, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PostalResolver for ScriptedResolver {
    async fn resolve(&self, pincode: &Pincode) -> Result<PostalAddress, PostalLookupError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(pincode.as_str().to_owned());
        }
        match self.entries.get(pincode.as_str()) {
            Some((city, state)) => Ok(PostalAddress {
                city: city.clone(),
                state: state.clone(),
            }),
            None => Err(PostalLookupError::NoRecords {
                pincode: pincode.as_str().to_owned(),
            }),
        }
    }
}
