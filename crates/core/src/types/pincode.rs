//! Postal pincode type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PincodeError {
    /// The input is not exactly six characters long.
    #[error("pincode must be exactly {expected} digits (got {len})")]
    Length {
        /// Required length.
        expected: usize,
        /// Actual input length.
        len: usize,
    },
    /// The input contains a non-digit character.
    #[error("pincode must contain only digits")]
    NonDigit,
}

/// An Indian postal index number (PIN code).
///
/// ## Constraints
///
/// - Exactly 6 ASCII digits
///
/// ## Examples
///
/// ```
/// use kirana_core::Pincode;
///
/// assert!(Pincode::parse("560001").is_ok());
/// assert!(Pincode::parse("5600").is_err());   // too short
/// assert!(Pincode::parse("56000a").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Pincode(String);

impl Pincode {
    /// Number of digits in a pincode.
    pub const LENGTH: usize = 6;

    /// Parse a `Pincode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PincodeError> {
        if s.len() != Self::LENGTH {
            return Err(PincodeError::Length {
                expected: Self::LENGTH,
                len: s.len(),
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PincodeError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the pincode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Pincode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Pincode {
    type Err = PincodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Pincode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
