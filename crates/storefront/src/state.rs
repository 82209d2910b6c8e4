//! Shared application state.
//!
//! [`AppState`] wires configuration, the cart ledger, and the address
//! form together and exposes the storefront's top-level operations. It is
//! generic over the postal resolver so tests can run without a network.

use crate::address::postal::{PostalClient, PostalResolver};
use crate::address::AddressForm;
use crate::cart::storage::CartStorage;
use crate::cart::CartLedger;
use crate::checkout::{format_order_message, whatsapp_url, CheckoutHandoff, WhatsappTarget};
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result};
use crate::pricing::{compute_summary, PricingSummary};

/// Application state holding the cart and the checkout form.
pub struct AppState<R = PostalClient> {
    config: StorefrontConfig,
    ledger: CartLedger,
    address: AddressForm<R>,
}

impl AppState {
    /// Build state with the real India Post resolver.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let resolver = PostalClient::new(config.pincode_api_url.clone());
        Self::with_resolver(config, resolver)
    }
}

impl<R: PostalResolver + Clone + 'static> AppState<R> {
    /// Build state with a custom postal resolver.
    #[must_use]
    pub fn with_resolver(config: StorefrontConfig, resolver: R) -> Self {
        let storage = CartStorage::new(config.data_dir.clone());
        let ledger = CartLedger::load(storage, config.limits);
        let address = AddressForm::new(resolver);
        Self {
            config,
            ledger,
            address,
        }
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// The cart ledger.
    #[must_use]
    pub const fn ledger(&self) -> &CartLedger {
        &self.ledger
    }

    /// Mutable access to the cart ledger.
    pub fn ledger_mut(&mut self) -> &mut CartLedger {
        &mut self.ledger
    }

    /// The address form.
    #[must_use]
    pub const fn address(&self) -> &AddressForm<R> {
        &self.address
    }

    /// Mutable access to the address form.
    pub fn address_mut(&mut self) -> &mut AddressForm<R> {
        &mut self.address
    }

    /// Price the current cart.
    #[must_use]
    pub fn summary(&self) -> PricingSummary {
        compute_summary(self.ledger.lines(), &self.config.pricing)
    }

    /// Render the order for WhatsApp handoff.
    ///
    /// # Errors
    ///
    /// [`AppError::EmptyCart`] when there is nothing to order, and
    /// [`AppError::AddressInvalid`] when the form does not validate; the
    /// per-field messages stay available on [`address`](Self::address).
    pub fn checkout(&mut self) -> Result<CheckoutHandoff> {
        if self.ledger.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let Some(address) = self.address.shipping_address() else {
            let missing = self
                .address
                .errors()
                .keys()
                .map(|field| field.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::AddressInvalid(missing));
        };

        let summary = self.summary();
        let message = format_order_message(
            self.ledger.lines(),
            &address,
            &summary.unlocked_rewards,
            &self.config.base_url,
        );

        Ok(CheckoutHandoff {
            mobile_url: whatsapp_url(&self.config.contact_phone, &message, WhatsappTarget::Mobile),
            web_url: whatsapp_url(&self.config.contact_phone, &message, WhatsappTarget::Web),
            message,
        })
    }

    /// Flush the cart to disk, surfacing any write error.
    ///
    /// # Errors
    ///
    /// Returns the storage error when the write fails.
    pub fn flush(&self) -> Result<()> {
        self.ledger.flush()?;
        Ok(())
    }
}
