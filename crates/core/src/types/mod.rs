//! Core types for Kirana.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod digits;
pub mod id;
pub mod mobile;
pub mod pincode;
pub mod price;
pub mod product;

pub use digits::strip_non_digits;
pub use id::ProductId;
pub use mobile::{MobileNumber, MobileNumberError};
pub use pincode::{Pincode, PincodeError};
pub use price::Price;
pub use product::Product;
