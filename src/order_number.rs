//! Human-readable order numbers.
//!
//! An order number is a pure function of the order's database id:
//! `ORD-` followed by the decimal id left-padded with zeros to six digits.
//! Ids beyond 999999 simply produce a longer numeral. The number is never
//! stored; both directions are derived on demand.

/// Format a database id as an order number, e.g. `1 -> "ORD-000001"`.
pub fn format_order_number(id: i64) -> String {
    format!("ORD-{id:06}")
}

/// Parse an order number back to its id.
///
/// Accepts only the exact `ORD-<digits>` form (after trimming surrounding
/// whitespace) with a positive id. Anything else returns `None`; malformed
/// input is a normal outcome for the caller, not an error.
pub fn parse_order_number(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("ORD-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = digits.parse::<i64>().ok()?;
    if id > 0 { Some(id) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_six_digit_padding() {
        assert_eq!(format_order_number(1), "ORD-000001");
        assert_eq!(format_order_number(123456), "ORD-123456");
    }

    #[test]
    fn formats_long_ids_without_truncation() {
        assert_eq!(format_order_number(1234567), "ORD-1234567");
    }

    #[test]
    fn parses_canonical_numbers() {
        assert_eq!(parse_order_number("ORD-000001"), Some(1));
        assert_eq!(parse_order_number("ORD-123456"), Some(123456));
        assert_eq!(parse_order_number("ORD-1234567"), Some(1234567));
        assert_eq!(parse_order_number("  ORD-000042  "), Some(42));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_order_number(""), None);
        assert_eq!(parse_order_number("ORD-"), None);
        assert_eq!(parse_order_number("ord-000123"), None);
        assert_eq!(parse_order_number("ORD-abc"), None);
        assert_eq!(parse_order_number("ORD-12a3"), None);
        assert_eq!(parse_order_number("ORD 000123"), None);
        assert_eq!(parse_order_number("XORD-000123"), None);
        assert_eq!(parse_order_number("ORD-000123X"), None);
    }

    #[test]
    fn rejects_non_positive_ids() {
        assert_eq!(parse_order_number("ORD-0"), None);
        assert_eq!(parse_order_number("ORD-000000"), None);
    }

    #[test]
    fn rejects_overflowing_ids() {
        assert_eq!(parse_order_number("ORD-99999999999999999999"), None);
    }

    #[test]
    fn round_trips_canonical_forms() {
        for id in [1_i64, 999, 123456, 999999, 1000000, 1234567] {
            let encoded = format_order_number(id);
            assert_eq!(parse_order_number(&encoded), Some(id));
        }
    }
}
