//! # Sequence Numbers
//!
//! Human-readable incrementing identifiers of the form `PREFIX-NNNNNN`.
//!
//! ## Format Contract
//! ```text
//! CUST-000042  →  next is exactly CUST-000043
//! (no rows)    →  first is exactly CUST-000001
//! ```
//!
//! This module is the pure half of sequence generation: parsing and
//! formatting. ALLOCATION lives in the storage layer as an atomic counter
//! (`sequence_counters` table, single upsert-returning statement), so two
//! concurrent creations can never be handed the same number. The old
//! read-the-max-then-increment pattern is deliberately not reproduced.

use crate::error::ValidationError;

/// Zero-padded width of the numeric suffix.
pub const SUFFIX_WIDTH: usize = 6;

/// Prefix for customer numbers.
pub const CUSTOMER_PREFIX: &str = "CUST";
/// Prefix for credit account numbers.
pub const CREDIT_PREFIX: &str = "CRED";
/// Prefix for loyalty card numbers.
pub const LOYALTY_PREFIX: &str = "LOYL";
/// Prefix for lay-bye contract numbers.
pub const LAYBYE_PREFIX: &str = "LAY";
/// Prefix for delivery numbers.
pub const DELIVERY_PREFIX: &str = "DEL";

/// Formats a sequence value as `PREFIX-NNNNNN`.
///
/// ## Example
/// ```rust
/// use marula_core::sequence::format_number;
///
/// assert_eq!(format_number("CUST", 43), "CUST-000043");
/// ```
pub fn format_number(prefix: &str, value: i64) -> String {
    format!("{}-{:0width$}", prefix, value, width = SUFFIX_WIDTH)
}

/// Parses the numeric suffix out of a `PREFIX-NNNNNN` identifier.
///
/// The prefix must match exactly; the suffix must be all digits.
pub fn parse_suffix(prefix: &str, identifier: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "sequence number".to_string(),
        reason: format!("expected {}-NNNNNN, got '{}'", prefix, identifier),
    };

    let rest = identifier
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(invalid)?;

    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    rest.parse::<i64>().map_err(|_| invalid())
}

/// The identifier following `last`, or the first identifier when there is
/// no predecessor.
pub fn next_after(prefix: &str, last: Option<&str>) -> Result<String, ValidationError> {
    let next = match last {
        Some(identifier) => parse_suffix(prefix, identifier)? + 1,
        None => 1,
    };
    Ok(format_number(prefix, next))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("CUST", 1), "CUST-000001");
        assert_eq!(format_number("CUST", 43), "CUST-000043");
        assert_eq!(format_number("LAY", 999_999), "LAY-999999");
        // Past the padding width the number simply grows
        assert_eq!(format_number("LAY", 1_000_000), "LAY-1000000");
    }

    #[test]
    fn test_parse_suffix() {
        assert_eq!(parse_suffix("CUST", "CUST-000042").unwrap(), 42);
        assert_eq!(parse_suffix("CRED", "CRED-000001").unwrap(), 1);

        assert!(parse_suffix("CUST", "CRED-000042").is_err());
        assert!(parse_suffix("CUST", "CUST-").is_err());
        assert!(parse_suffix("CUST", "CUST-12AB34").is_err());
        assert!(parse_suffix("CUST", "CUST000042").is_err());
    }

    #[test]
    fn test_next_after() {
        assert_eq!(next_after("CUST", Some("CUST-000042")).unwrap(), "CUST-000043");
        assert_eq!(next_after("CUST", None).unwrap(), "CUST-000001");
    }
}
