//! Digit filtering for numeric form inputs.

/// Strip every non-digit character from a string.
///
/// Mobile number and pincode inputs accept free-form text (pasted values,
/// separators, stray spaces); this is the single normalization point
/// applied before length validation.
///
/// # Examples
///
/// ```
/// use kirana_core::strip_non_digits;
///
/// assert_eq!(strip_non_digits("98765 43210"), "9876543210");
/// assert_eq!(strip_non_digits("560-001"), "560001");
/// assert_eq!(strip_non_digits("abc"), "");
/// ```
#[must_use]
pub fn strip_non_digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
