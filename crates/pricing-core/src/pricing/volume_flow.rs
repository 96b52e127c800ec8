use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::fair_share::FlowMatrix;
use crate::types::*;

/// Volume a SKU gains or loses from the price moves of every other SKU.
///
/// `-Σ_{t≠s} flow(s, t)/100 * own_change(t)` over row `index` of the flow
/// matrix. The sign convention is calibrated against the pricing workbook and
/// must not be re-derived.
pub fn volume_change_from_others(flows: &FlowMatrix, own_changes: &[Percent], index: usize) -> Percent {
    let dot: Decimal = flows
        .row(index)
        .iter()
        .zip(own_changes)
        .enumerate()
        .filter(|(t, _)| *t != index)
        .map(|(_, (flow, change))| *flow / dec!(100) * *change)
        .sum();
    -dot
}

/// Redistribution term for every SKU in the flow matrix order.
pub fn redistribute(flows: &FlowMatrix, own_changes: &[Percent]) -> Vec<Percent> {
    (0..flows.names.len())
        .map(|i| volume_change_from_others(flows, own_changes, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::fair_share::{FairShareMatrix, FairShareStatus};

    fn sku(name: &str, share: Decimal) -> Sku {
        let mut s = Sku::new(name, Ownership::Own);
        s.volume_share = Some(share);
        s
    }

    #[test]
    fn test_at_fair_share_pulls_proportionally() {
        let skus = vec![sku("A", dec!(60)), sku("B", dec!(40))];
        let flows = FairShareMatrix::new().flows(&skus);
        // A drops 20%, B's row weights A at 60%: -(0.6 * -20) = 12
        let own = vec![dec!(-20), Decimal::ZERO];
        assert_eq!(volume_change_from_others(&flows, &own, 1), dec!(12));
        // A's own term is excluded from its own row
        assert_eq!(volume_change_from_others(&flows, &own, 0), Decimal::ZERO);
    }

    #[test]
    fn test_unbalanced_matrix_moves_nothing() {
        let skus = vec![sku("A", dec!(60)), sku("B", dec!(40))];
        let (m, _) =
            FairShareMatrix::new().set_classification("B", "A", FairShareStatus::AboveFairShare);
        let flows = m.flows(&skus);
        let out = redistribute(&flows, &[dec!(-20), dec!(5)]);
        assert_eq!(out, vec![Decimal::ZERO, Decimal::ZERO]);
    }

    #[test]
    fn test_contributions_from_several_skus_add_up() {
        let skus = vec![sku("A", dec!(50)), sku("B", dec!(30)), sku("C", dec!(20))];
        let flows = FairShareMatrix::new().flows(&skus);
        let own = vec![dec!(-10), dec!(-5), Decimal::ZERO];
        // C: -(0.5*-10 + 0.3*-5) = 6.5
        assert_eq!(redistribute(&flows, &own)[2], dec!(6.5));
    }
}
