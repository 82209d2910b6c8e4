//! Mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum MobileNumberError {
    /// The input is not exactly ten characters long.
    #[error("mobile number must be exactly {expected} digits (got {len})")]
    Length {
        /// Required length.
        expected: usize,
        /// Actual input length.
        len: usize,
    },
    /// The input contains a non-digit character.
    #[error("mobile number must contain only digits")]
    NonDigit,
}

/// A 10-digit Indian mobile number, without country code.
///
/// Country-code handling lives at the checkout boundary (the WhatsApp
/// handoff carries the store's full contact number); customer numbers are
/// stored as the bare 10 digits the form collects.
///
/// ## Examples
///
/// ```
/// use kirana_core::MobileNumber;
///
/// assert!(MobileNumber::parse("9876543210").is_ok());
/// assert!(MobileNumber::parse("98765").is_err());      // too short
/// assert!(MobileNumber::parse("98765x3210").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Number of digits in a mobile number.
    pub const LENGTH: usize = 10;

    /// Parse a `MobileNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly ten ASCII digits.
    pub fn parse(s: &str) -> Result<Self, MobileNumberError> {
        if s.len() != Self::LENGTH {
            return Err(MobileNumberError::Length {
                expected: Self::LENGTH,
                len: s.len(),
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MobileNumberError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the mobile number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `MobileNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MobileNumber {
    type Err = MobileNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MobileNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
