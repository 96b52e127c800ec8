use rust_decimal::Decimal;

use crate::types::*;

/// Volume response to the SKU's own price change: `price_change * elasticity`.
///
/// Absent price change or elasticity yields zero.
pub fn own_volume_change_pct(sku: &Sku, price_change: Option<Percent>) -> Percent {
    match (price_change, sku.price_elasticity) {
        (Some(pct), Some(elasticity)) => pct * elasticity,
        _ => Decimal::ZERO,
    }
}

/// Own-elasticity volume change for every SKU, in input order.
pub fn own_volume_changes(skus: &[Sku], price_changes: &PriceChanges) -> Vec<Percent> {
    skus.iter()
        .map(|s| own_volume_change_pct(s, price_changes.get(&s.name).copied()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lager() -> Sku {
        let mut s = Sku::new("Lager", Ownership::Own);
        s.price_elasticity = Some(dec!(-2));
        s
    }

    #[test]
    fn test_price_increase_reduces_volume() {
        assert_eq!(own_volume_change_pct(&lager(), Some(dec!(10))), dec!(-20));
    }

    #[test]
    fn test_price_cut_grows_volume() {
        assert_eq!(own_volume_change_pct(&lager(), Some(dec!(-5))), dec!(10));
    }

    #[test]
    fn test_missing_inputs_are_zero() {
        assert_eq!(own_volume_change_pct(&lager(), None), Decimal::ZERO);
        let bare = Sku::new("Cider", Ownership::Competitor);
        assert_eq!(own_volume_change_pct(&bare, Some(dec!(10))), Decimal::ZERO);
    }

    #[test]
    fn test_vector_follows_input_order() {
        let mut stout = Sku::new("Stout", Ownership::Competitor);
        stout.price_elasticity = Some(dec!(-1.5));
        let mut changes = PriceChanges::new();
        changes.insert("Stout".into(), dec!(4));
        let out = own_volume_changes(&[lager(), stout], &changes);
        assert_eq!(out, vec![Decimal::ZERO, dec!(-6.0)]);
    }
}
