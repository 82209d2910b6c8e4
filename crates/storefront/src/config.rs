//! Configuration from environment variables.
//!
//! A `.env` file is honored when present.
//!
//! ## Required
//!
//! - `KIRANA_BASE_URL`: public site URL used for product links in order
//!   messages (trailing slash is trimmed)
//! - `KIRANA_CONTACT_PHONE`: WhatsApp number orders are sent to, with
//!   country code
//!
//! ## Optional
//!
//! - `KIRANA_DATA_DIR`: directory for the persisted cart (default `./data`)
//! - `KIRANA_PINCODE_API_URL`: postal lookup endpoint (default India Post)
//! - `KIRANA_MAX_ITEM_QUANTITY`: per-item quantity cap (default `10`)
//! - `KIRANA_MAX_CART_ITEMS`: distinct line item cap (default `100`)
//! - `KIRANA_FREE_SHIPPING_THRESHOLD`: rupees above which shipping is free
//!   (default `500`)
//! - `KIRANA_FLAT_SHIPPING_FEE`: rupees charged below the threshold
//!   (default `50`)
//! - `KIRANA_TAX_RATE`: fraction of the subtotal, `0` to `1`
//!   (default `0.05`)
//! - `KIRANA_MILESTONES`: JSON array of `{"amount", "label"}` reward
//!   milestones (default ladder built in)

use std::path::PathBuf;

use kirana_core::{strip_non_digits, Price};
use rust_decimal::Decimal;

use crate::address::postal;
use crate::cart::CartLimits;
use crate::pricing::{default_milestones, Milestone, PricingConfig};

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    /// An environment variable is set to a value that does not parse.
    #[error("invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront runtime configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Public site URL, without trailing slash.
    pub base_url: String,
    /// WhatsApp contact number with country code, digits only.
    pub contact_phone: String,
    /// Directory holding the persisted cart file.
    pub data_dir: PathBuf,
    /// Postal lookup API base URL.
    pub pincode_api_url: String,
    /// Cart size caps.
    pub limits: CartLimits,
    /// Shipping, tax, and milestone rules.
    pub pricing: PricingConfig,
}

impl StorefrontConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a required variable is missing or
    /// any variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url("KIRANA_BASE_URL", &get_required_env("KIRANA_BASE_URL")?)?;
        let contact_phone = parse_contact_phone(
            "KIRANA_CONTACT_PHONE",
            &get_required_env("KIRANA_CONTACT_PHONE")?,
        )?;

        let data_dir = PathBuf::from(get_env_or_default("KIRANA_DATA_DIR", "./data"));
        let pincode_api_url =
            get_env_or_default("KIRANA_PINCODE_API_URL", postal::DEFAULT_API_URL);

        let limits = CartLimits {
            max_item_quantity: match get_optional_env("KIRANA_MAX_ITEM_QUANTITY") {
                Some(raw) => parse_positive_u32("KIRANA_MAX_ITEM_QUANTITY", &raw)?,
                None => CartLimits::default().max_item_quantity,
            },
            max_cart_items: match get_optional_env("KIRANA_MAX_CART_ITEMS") {
                Some(raw) => parse_positive_usize("KIRANA_MAX_CART_ITEMS", &raw)?,
                None => CartLimits::default().max_cart_items,
            },
        };

        let free_shipping_threshold = match get_optional_env("KIRANA_FREE_SHIPPING_THRESHOLD") {
            Some(raw) => Price::new(parse_decimal("KIRANA_FREE_SHIPPING_THRESHOLD", &raw)?),
            None => Price::from_rupees(500),
        };
        let flat_shipping_fee = match get_optional_env("KIRANA_FLAT_SHIPPING_FEE") {
            Some(raw) => Price::new(parse_decimal("KIRANA_FLAT_SHIPPING_FEE", &raw)?),
            None => Price::from_rupees(50),
        };
        let tax_rate = match get_optional_env("KIRANA_TAX_RATE") {
            Some(raw) => parse_tax_rate("KIRANA_TAX_RATE", &raw)?,
            None => Decimal::new(5, 2),
        };
        let milestones = match get_optional_env("KIRANA_MILESTONES") {
            Some(raw) => parse_milestones("KIRANA_MILESTONES", &raw)?,
            None => default_milestones(),
        };

        Ok(Self {
            base_url,
            contact_phone,
            data_dir,
            pincode_api_url,
            limits,
            pricing: PricingConfig::new(
                free_shipping_threshold,
                flat_shipping_fee,
                tax_rate,
                milestones,
            ),
        })
    }
}

// ============ Environment Helpers ============

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

// ============ Value Parsers ============

fn parse_base_url(name: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_contact_phone(name: &str, raw: &str) -> Result<String, ConfigError> {
    let digits = strip_non_digits(raw);
    if digits.is_empty() {
        return Err(ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned()));
    }
    Ok(digits)
}

fn parse_positive_u32(name: &str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned())),
    }
}

fn parse_positive_usize(name: &str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned())),
    }
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, ConfigError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned()))
}

fn parse_tax_rate(name: &str, raw: &str) -> Result<Decimal, ConfigError> {
    let rate = parse_decimal(name, raw)?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned()));
    }
    Ok(rate)
}

fn parse_milestones(name: &str, raw: &str) -> Result<Vec<Milestone>, ConfigError> {
    serde_json::from_str(raw)
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw.to_owned()))
}
