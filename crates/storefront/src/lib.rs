//! Kirana Storefront engine.
//!
//! This crate provides the cart, pricing, address, and checkout logic as a
//! library, allowing it to be driven from the CLI and tested directly.
//!
//! # Modules
//!
//! - [`cart`] - The persisted cart ledger and its quantity/size invariants
//! - [`pricing`] - Pure order summary: totals, shipping, tax, reward milestones
//! - [`address`] - Checkout address form with debounced pincode resolution
//! - [`checkout`] - WhatsApp order message and deep links
//! - [`config`] - Environment-variable configuration
//! - [`state`] - The wired-up application container

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod pricing;
pub mod state;
