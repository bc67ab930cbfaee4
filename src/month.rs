//! Resolves calendar month names to their ordinals.

use crate::Error;

/// The twelve English month names in calendar order. The ordinal of a month
/// is its index in this table plus one.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Resolve an English month name to its 1-based ordinal.
///
/// Matching is exact and case-sensitive: "March" resolves, "march" does not.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `name` is not one of the twelve English
/// month names. Callers should turn this into a client-error response.
pub fn resolve(name: &str) -> Result<u8, Error> {
    MONTH_NAMES
        .iter()
        .position(|&month| month == name)
        .map(|index| index as u8 + 1)
        .ok_or_else(|| Error::InvalidMonth(name.to_owned()))
}
