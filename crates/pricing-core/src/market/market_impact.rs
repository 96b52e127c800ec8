use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use super::price_impact::project_sku;
use crate::catalog::search::SkuCatalog;
use crate::error::PricingError;
use crate::types::*;
use crate::PricingResult;

/// One requested price move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeRequest {
    pub sku_name: String,
    pub price_change: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketImpactInput {
    pub catalog: SkuCatalog,
    pub changes: Vec<PriceChangeRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShare {
    pub name: String,
    pub volume_share: Percent,
    pub value_share: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketImpactOutput {
    pub market_volume_change_pct: Percent,
    pub market_revenue_change_pct: Percent,
    pub new_market_shares: Vec<MarketShare>,
}

/// Market-wide effect of several simultaneous price changes, elasticity only.
///
/// Each change is projected from the catalog baseline; a later change to the
/// same SKU replaces an earlier one. Revenue is `customer_price * volume_sold`.
pub fn analyze_market_impact(
    input: &MarketImpactInput,
) -> PricingResult<ComputationOutput<MarketImpactOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.catalog.is_empty() {
        return Err(PricingError::InsufficientData(
            "Market impact requires a non-empty catalog".into(),
        ));
    }

    let mut projected: HashMap<&str, (Decimal, Liters)> = HashMap::new();
    for change in &input.changes {
        let sku = input.catalog.get(&change.sku_name)?;
        let p = project_sku(sku, change.price_change);
        projected.insert(sku.name.as_str(), (p.new_price, p.new_volume));
    }

    let baseline: Vec<(&str, Decimal, Liters)> = input
        .catalog
        .skus()
        .iter()
        .map(|s| (s.name.as_str(), s.customer_price.unwrap_or_default(), s.volume_sold()))
        .collect();
    let scenario: Vec<(&str, Decimal, Liters)> = baseline
        .iter()
        .map(|(name, price, volume)| match projected.get(name) {
            Some((p, v)) => (*name, *p, *v),
            None => (*name, *price, *volume),
        })
        .collect();

    let (old_volume, old_revenue) = market_totals(&baseline);
    let (new_volume, new_revenue) = market_totals(&scenario);

    if old_volume.is_zero() {
        warnings.push("Baseline market volume is zero; volume change reported as 0".into());
    }
    if old_revenue.is_zero() {
        warnings.push("Baseline market revenue is zero; revenue change reported as 0".into());
    }

    let new_market_shares = scenario
        .iter()
        .map(|(name, price, volume)| MarketShare {
            name: name.to_string(),
            volume_share: (ratio_or_zero(*volume, new_volume) * dec!(100)).round_dp(1),
            value_share: (ratio_or_zero(*price * *volume, new_revenue) * dec!(100)).round_dp(1),
        })
        .collect();

    let output = MarketImpactOutput {
        market_volume_change_pct: (ratio_or_zero(new_volume - old_volume, old_volume) * dec!(100))
            .round_dp(1),
        market_revenue_change_pct: (ratio_or_zero(new_revenue - old_revenue, old_revenue)
            * dec!(100))
        .round_dp(1),
        new_market_shares,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Elasticity-Only Market Impact",
        &serde_json::json!({
            "catalog_skus": input.catalog.len(),
            "num_changes": input.changes.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn market_totals(rows: &[(&str, Decimal, Liters)]) -> (Liters, Decimal) {
    rows.iter().fold((Decimal::ZERO, Decimal::ZERO), |(v, r), (_, price, volume)| {
        (v + *volume, r + *price * *volume)
    })
}
