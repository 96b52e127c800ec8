use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// First number in `text`: digits with an optional fractional part.
fn leading_number(text: &str) -> Option<(Decimal, &str)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let mut end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if rest[end..].starts_with('.') {
        let frac = &rest[end + 1..];
        end += 1 + frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
    }
    let number = Decimal::from_str(rest[..end].trim_end_matches('.')).ok()?;
    Some((number, &rest[end..]))
}

/// Number of units in a multipack, e.g. `"6 x"` or `"12PK"`.
pub fn parse_pack_size(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().to_uppercase();
    leading_number(&cleaned).map(|(n, _)| n)
}

/// Unit size normalised to milliliters (liquids) or grams (solids).
///
/// Liter and kilogram suffixes are scaled by 1000; `ML` and `G` pass through.
pub fn parse_unit_size(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().to_uppercase();
    let (number, suffix) = leading_number(&cleaned)?;
    let unit = suffix.trim();
    let scaled = if unit.starts_with("KG") {
        number * dec!(1000)
    } else if unit.starts_with("ML") || unit.starts_with('G') {
        number
    } else if unit.starts_with('L') {
        number * dec!(1000)
    } else {
        number
    };
    Some(scaled)
}
