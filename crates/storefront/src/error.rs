//! Unified error handling for the storefront engine.
//!
//! Entry points (the CLI, integration flows) return `Result<T, AppError>`;
//! subsystem errors convert in via `#[from]`.

use thiserror::Error;

use crate::address::postal::PostalLookupError;
use crate::cart::CartError;
use crate::cart::storage::CartStorageError;
use crate::config::ConfigError;

/// Application-level error type for the storefront engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Cart persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] CartStorageError),

    /// Pincode lookup failed.
    #[error("Lookup error: {0}")]
    Lookup(#[from] PostalLookupError),

    /// Address validation failed; lists the offending fields.
    #[error("Address is incomplete: {0}")]
    AddressInvalid(String),

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
