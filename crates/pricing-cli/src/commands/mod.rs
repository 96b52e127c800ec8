pub mod catalog;
pub mod contraction;
pub mod fair_share;
pub mod impact;
pub mod market;
pub mod sales;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::input;

/// Load a typed input from `--input`, else from piped stdin.
///
/// Returns `Ok(None)` when neither is present so callers can fall back to flags.
pub(crate) fn load_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        Ok(Some(input::file::read_input(path)?))
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(Some(serde_json::from_value(data)?))
    } else {
        Ok(None)
    }
}

/// Parse `NAME=PCT`. The last `=` splits, so names may contain `=`.
pub(crate) fn parse_price_change(raw: &str) -> Result<(String, Decimal), Box<dyn std::error::Error>> {
    let (name, pct) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("Price change must be NAME=PCT, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Price change '{}' has no SKU name", raw).into());
    }
    let pct: Decimal = pct
        .trim()
        .parse()
        .map_err(|_| format!("Price change '{}' is not a number", pct.trim()))?;
    Ok((name.to_string(), pct))
}

/// Append a note to the `warnings` array of a serialised envelope.
pub(crate) fn push_warning(value: &mut Value, note: String) {
    if let Some(Value::Array(warnings)) = value.get_mut("warnings") {
        warnings.push(Value::String(note));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price_change() {
        let (name, pct) = parse_price_change("Golden Lager 6x330=5.5").unwrap();
        assert_eq!(name, "Golden Lager 6x330");
        assert_eq!(pct, dec!(5.5));

        let (name, pct) = parse_price_change("A=B=-3").unwrap();
        assert_eq!(name, "A=B");
        assert_eq!(pct, dec!(-3));
    }

    #[test]
    fn test_parse_price_change_rejects_malformed() {
        assert!(parse_price_change("Lager").is_err());
        assert!(parse_price_change("=5").is_err());
        assert!(parse_price_change("Lager=five").is_err());
    }

    #[test]
    fn test_push_warning() {
        let mut v = serde_json::json!({"result": {}, "warnings": []});
        push_warning(&mut v, "careful".into());
        assert_eq!(v["warnings"][0], "careful");
    }
}
