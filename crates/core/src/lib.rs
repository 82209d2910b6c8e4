//! Kirana Core - Shared domain types.
//!
//! This crate provides common types used across all Kirana components:
//! - `storefront` - Cart, pricing, address, and checkout engine
//! - `cli` - Command-line driver for cart management and checkout
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no file access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product ids, prices, pincodes, and
//!   mobile numbers, plus the catalog product read model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
