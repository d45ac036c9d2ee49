use rust_decimal::Decimal;
use std::str::FromStr;

/// Strip thousands separators from a raw amount capture ("12,345.67").
pub fn strip_separators(s: &str) -> String {
    s.replace(',', "")
}

/// Parse a human-formatted amount into a lossless decimal.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&strip_separators(s.trim())).ok()
}

/// Normalize a raw amount into the canonical record form: base-10 decimal
/// string with exactly two fraction digits and no separators. Malformed
/// input degrades to `"0.00"` rather than failing.
pub fn normalize_amount(s: &str) -> String {
    match parse_amount(s) {
        Some(mut d) => {
            d.rescale(2);
            d.to_string()
        }
        None => "0.00".to_string(),
    }
}
