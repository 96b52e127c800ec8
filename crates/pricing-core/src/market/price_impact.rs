use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::*;
use crate::PricingResult;

/// Input for a single-SKU, elasticity-only price impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceImpactInput {
    pub sku: Sku,
    pub price_change_pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceImpactOutput {
    pub new_price: Decimal,
    pub new_volume: Liters,
    pub new_revenue: Decimal,
    /// Absent when the SKU has no GP margin
    pub new_gp: Option<Decimal>,
    pub volume_change_pct: Percent,
}

/// Price and volume after a price change, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSku {
    pub new_price: Decimal,
    pub new_volume: Liters,
}

/// Apply `price_change_pct` to the shelf price and let volume respond through
/// the SKU's elasticity. SKUs without an elasticity keep their volume.
///
/// Unrounded; see [`project_sku`] for the rounded figures.
fn project(sku: &Sku, price_change_pct: Percent) -> (Decimal, Liters) {
    let multiplier = Decimal::ONE + price_change_pct / dec!(100);
    let new_price = sku.customer_price.unwrap_or_default() * multiplier;
    let new_volume = match sku.price_elasticity {
        Some(e) => sku.volume_sold() * (Decimal::ONE + e * price_change_pct / dec!(100)),
        None => sku.volume_sold(),
    };
    (new_price, new_volume)
}

/// Projected price and volume, rounded to two decimals.
pub fn project_sku(sku: &Sku, price_change_pct: Percent) -> ProjectedSku {
    let (new_price, new_volume) = project(sku, price_change_pct);
    ProjectedSku {
        new_price: new_price.round_dp(2),
        new_volume: new_volume.round_dp(2),
    }
}

pub fn calculate_price_impact(
    input: &PriceImpactInput,
) -> PricingResult<ComputationOutput<PriceImpactOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let sku = &input.sku;

    if sku.customer_price.is_none() {
        warnings.push(format!("SKU '{}' has no customer price; treated as 0", sku.name));
    }
    if sku.price_elasticity.is_none() {
        warnings.push(format!(
            "SKU '{}' has no price elasticity; volume held constant",
            sku.name
        ));
    }
    if sku.volume_sold().is_zero() {
        warnings.push(format!(
            "SKU '{}' has no volume sold; volume change reported as 0",
            sku.name
        ));
    }

    // Derived figures use the unrounded projection; only outputs are rounded
    let (new_price, new_volume) = project(sku, input.price_change_pct);
    let new_revenue = new_price * new_volume;
    let new_gp = sku.gp.map(|gp| (new_revenue * gp / dec!(100)).round_dp(2));
    let volume_change_pct =
        (ratio_or_zero(new_volume - sku.volume_sold(), sku.volume_sold()) * dec!(100)).round_dp(1);

    let output = PriceImpactOutput {
        new_price: new_price.round_dp(2),
        new_volume: new_volume.round_dp(2),
        new_revenue: new_revenue.round_dp(2),
        new_gp,
        volume_change_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-SKU Own-Elasticity Price Impact",
        &serde_json::json!({
            "sku": sku.name,
            "price_change_pct": input.price_change_pct.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lager() -> Sku {
        Sku {
            customer_price: Some(dec!(2.50)),
            volume_sold: Some(dec!(1000)),
            price_elasticity: Some(dec!(-1.8)),
            gp: Some(dec!(30)),
            ..Sku::new("Lager", Ownership::Own)
        }
    }

    #[test]
    fn test_price_increase() {
        let input = PriceImpactInput {
            sku: lager(),
            price_change_pct: dec!(10),
        };
        let out = calculate_price_impact(&input).unwrap().result;
        assert_eq!(out.new_price, dec!(2.75));
        // 1000 * (1 - 0.18) = 820
        assert_eq!(out.new_volume, dec!(820));
        assert_eq!(out.new_revenue, dec!(2255));
        // 2255 * 30% = 676.5
        assert_eq!(out.new_gp, Some(dec!(676.5)));
        assert_eq!(out.volume_change_pct, dec!(-18.0));
    }

    #[test]
    fn test_revenue_uses_unrounded_price() {
        let mut sku = lager();
        sku.customer_price = Some(dec!(2.345));
        sku.price_elasticity = None;
        let out = calculate_price_impact(&PriceImpactInput {
            sku,
            price_change_pct: dec!(10),
        })
        .unwrap()
        .result;
        // 2.5795 shown as 2.58, but revenue is 2.5795 * 1000
        assert_eq!(out.new_price, dec!(2.58));
        assert_eq!(out.new_revenue, dec!(2579.50));
        assert_eq!(out.new_gp, Some(dec!(773.85)));
    }

    #[test]
    fn test_missing_elasticity_keeps_volume() {
        let mut sku = lager();
        sku.price_elasticity = None;
        sku.gp = None;
        let out = calculate_price_impact(&PriceImpactInput {
            sku,
            price_change_pct: dec!(-5),
        })
        .unwrap();
        assert_eq!(out.result.new_volume, dec!(1000));
        assert_eq!(out.result.volume_change_pct, Decimal::ZERO);
        assert_eq!(out.result.new_gp, None);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_zero_volume_does_not_divide() {
        let mut sku = lager();
        sku.volume_sold = None;
        let out = calculate_price_impact(&PriceImpactInput {
            sku,
            price_change_pct: dec!(10),
        })
        .unwrap();
        assert_eq!(out.result.volume_change_pct, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("no volume sold")));
    }
}
