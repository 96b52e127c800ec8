use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use super::contraction::{self, ContractionParams};
use super::elasticity;
use super::fair_share::{BalanceCheck, FairShareMatrix};
use super::volume_flow;
use crate::error::PricingError;
use crate::types::*;
use crate::PricingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Snapshot of everything a recalculation needs. The engine keeps no state
/// between calls; callers rebuild this from their own storage each time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactInput {
    /// Full market, used for share denominators
    #[serde(default)]
    pub catalog: Vec<Sku>,
    /// SKUs under analysis, in display order
    pub analysis_set: Vec<Sku>,
    #[serde(default)]
    pub price_changes: PriceChanges,
    #[serde(default)]
    pub fair_share: FairShareMatrix,
    /// No market contraction is applied when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contraction: Option<ContractionParams>,
    #[serde(default)]
    pub totals_basis: TotalsBasis,
    /// Pre-summed market totals; take precedence over `totals_basis`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_totals: Option<MarketTotals>,
}

/// Projected impact for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuImpact {
    pub name: String,
    pub ownership: Ownership,
    pub price_change_pct: Percent,
    pub own_volume_change_pct: Percent,
    pub volume_change_from_others_pct: Percent,
    pub market_contraction_pct: Percent,
    /// Net of own elasticity, volume flow and market contraction
    pub volume_impact_pct: Percent,
    pub volume_impact_mass_hl: Hectoliters,
    pub rsv_impact_pct: Percent,
    pub rsv_impact_mass: Millions,
    pub new_volume_share_pct: Percent,
    pub volume_share_delta_pp: PercentagePoints,
    pub new_value_share_pct: Percent,
    pub value_share_delta_pp: PercentagePoints,
    /// Owned SKUs only
    pub gp_impact_pct: Option<Percent>,
    /// Owned SKUs only
    pub gp_impact_mass: Option<Millions>,
}

/// Impact rolled up over the owned SKUs of the analysis set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioImpact {
    pub owned_skus: usize,
    pub volume_impact_pct: Percent,
    pub volume_impact_mass_hl: Hectoliters,
    pub rsv_impact_pct: Percent,
    pub rsv_impact_mass: Millions,
    pub current_volume_share_pct: Percent,
    pub new_volume_share_pct: Percent,
    pub volume_share_delta_pp: PercentagePoints,
    pub current_value_share_pct: Percent,
    pub new_value_share_pct: Percent,
    pub value_share_delta_pp: PercentagePoints,
    pub gp_impact_pct: Percent,
    pub gp_impact_mass: Millions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactOutput {
    /// One entry per analysed SKU, in analysis-set order
    pub per_sku: Vec<SkuImpact>,
    pub portfolio: PortfolioImpact,
    pub fair_share_balance: BalanceCheck,
    /// Volume-weighted price change as a fraction
    pub weighted_price_change: Decimal,
    pub market_contraction_pct: Percent,
    pub market_totals: MarketTotals,
}

impl ImpactOutput {
    pub fn sku(&self, name: &str) -> Option<&SkuImpact> {
        self.per_sku.iter().find(|s| s.name == name)
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Recompute volume, revenue, share and margin impacts for a pricing
/// scenario.
///
/// Order of evaluation per SKU:
/// 1. own-elasticity volume change
/// 2. volume flow from the other SKUs via the fair-share matrix
/// 3. uniform market contraction
/// 4. net volume, RSV, share and (owned only) GP impacts
///
/// The only hard failures are contract violations: duplicate names in the
/// analysis set, or price-change / fair-share entries naming SKUs outside it.
/// Economic degeneracies degrade to zero and are reported as warnings.
pub fn compute_impacts(input: &ImpactInput) -> PricingResult<ComputationOutput<ImpactOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;
    let skus = &input.analysis_set;

    let totals = resolve_totals(input, &mut warnings);
    let total_volume = totals.total_volume_sold();

    // Own elasticity
    let own = elasticity::own_volume_changes(skus, &input.price_changes);

    // Volume flow
    let flows = input.fair_share.flows(skus);
    if let Some(w) = flows.balance.warning() {
        warnings.push(w);
    }
    let from_others = volume_flow::redistribute(&flows, &own);

    // Market contraction
    let weighted = contraction::weighted_price_change(skus, &input.price_changes, total_volume);
    let market_contraction = match &input.contraction {
        None => Decimal::ZERO,
        Some(params) if !params.is_valid() => {
            warnings.push(format!(
                "Contraction parameters k = {}, n = {} are not both positive; \
                 market contraction not applied",
                params.k, params.n
            ));
            Decimal::ZERO
        }
        Some(params) => match contraction::market_contraction_pct(params, weighted, total_volume) {
            Some(v) => v,
            None => {
                warnings.push(format!(
                    "Weighted price change {weighted} with k = {}, n = {} has no finite \
                     contraction; market contraction set to 0",
                    params.k, params.n
                ));
                Decimal::ZERO
            }
        },
    };

    if totals.total_volume_sold_hl.is_zero() && !skus.is_empty() {
        warnings.push("Total market volume is zero; volume shares reported as 0".into());
    }
    if totals.total_rsv_millions.is_zero() && !skus.is_empty() {
        warnings.push("Total market RSV is zero; value shares reported as 0".into());
    }

    let per_sku: Vec<SkuImpact> = skus
        .iter()
        .enumerate()
        .map(|(i, sku)| {
            let price_change = input
                .price_changes
                .get(&sku.name)
                .copied()
                .unwrap_or_default();
            sku_impact(
                sku,
                price_change,
                own[i],
                from_others[i],
                market_contraction,
                &totals,
            )
            .unwrap_or_else(|| {
                warnings.push(format!(
                    "Impact for '{}' exceeds the decimal range; reported as 0",
                    sku.name
                ));
                zero_impact(sku, price_change)
            })
        })
        .collect();

    let portfolio = portfolio_impact(skus, &per_sku, &totals).unwrap_or_else(|| {
        warnings.push("Portfolio rollup exceeds the decimal range; reported as 0".into());
        PortfolioImpact::default()
    });
    let owned = portfolio.owned_skus;

    let output = ImpactOutput {
        per_sku,
        portfolio,
        fair_share_balance: flows.balance,
        weighted_price_change: weighted,
        market_contraction_pct: market_contraction,
        market_totals: totals,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Own Elasticity + Fair-Share Volume Flow + Power-Law Market Contraction",
        &serde_json::json!({
            "num_skus": skus.len(),
            "owned_skus": owned,
            "catalog_skus": input.catalog.len(),
            "totals_basis": input.totals_basis,
            "totals_supplied": input.market_totals.is_some(),
            "contraction": input.contraction.map(|p| serde_json::json!({
                "k": p.k.to_string(),
                "n": p.n.to_string(),
            })),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate(input: &ImpactInput) -> PricingResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for sku in &input.analysis_set {
        if !seen.insert(sku.name.as_str()) {
            return Err(PricingError::InvalidInput {
                field: "analysis_set".into(),
                reason: format!("Duplicate SKU '{}'", sku.name),
            });
        }
        if !input.catalog.is_empty() && !input.catalog.iter().any(|c| c.name == sku.name) {
            return Err(PricingError::UnknownSku {
                name: sku.name.clone(),
                context: "analysis_set (not in catalog)".into(),
            });
        }
    }

    for name in input.price_changes.keys() {
        if !seen.contains(name.as_str()) {
            return Err(PricingError::UnknownSku {
                name: name.clone(),
                context: "price_changes".into(),
            });
        }
    }

    super::validate_fair_share_names(&input.fair_share, &input.analysis_set)
}

/// Pick the share denominators: supplied totals, else the configured basis.
/// A catalog basis without a catalog falls back to the analysis set.
fn resolve_totals(input: &ImpactInput, warnings: &mut Vec<String>) -> MarketTotals {
    if let Some(totals) = input.market_totals {
        return totals;
    }
    match input.totals_basis {
        TotalsBasis::Catalog if !input.catalog.is_empty() => MarketTotals::from_skus(&input.catalog),
        TotalsBasis::Catalog => {
            if !input.analysis_set.is_empty() {
                warnings.push(
                    "No catalog supplied; market totals summed over the analysis set".into(),
                );
            }
            MarketTotals::from_skus(&input.analysis_set)
        }
        TotalsBasis::AnalysisSet => MarketTotals::from_skus(&input.analysis_set),
    }
}

/// Net impact for one SKU given its three volume components.
///
/// `None` when a product leaves the `Decimal` range.
pub fn sku_impact(
    sku: &Sku,
    price_change: Percent,
    own_volume_change: Percent,
    volume_change_from_others: Percent,
    market_contraction: Percent,
    totals: &MarketTotals,
) -> Option<SkuImpact> {
    let hundred = dec!(100);

    let net = own_volume_change
        .checked_add(volume_change_from_others)?
        .checked_add(market_contraction)?;
    let volume_mass = sku.volume_sold_hl().checked_mul(net / hundred)?;

    // Volume and price effects compound
    let rsv_pct = net
        .checked_add(price_change)?
        .checked_add(net.checked_mul(price_change)? / hundred)?;
    let rsv_factor = Decimal::ONE.checked_add(rsv_pct / hundred)?;
    let rsv_mass = sku.rsv().checked_mul(rsv_pct / hundred)?;

    let new_volume_share = checked_ratio(
        sku.volume_sold_hl().checked_add(volume_mass)?,
        totals.total_volume_sold_hl,
    )?
    .checked_mul(hundred)?;
    let new_value_share = checked_ratio(sku.rsv().checked_mul(rsv_factor)?, totals.total_rsv_millions)?
        .checked_mul(hundred)?;

    let (gp_pct, gp_mass) = if sku.is_own() {
        let price_factor = Decimal::ONE.checked_add(price_change / hundred)?;
        let per_unit = sku.gp().checked_mul(price_factor)?.checked_sub(sku.gp())?;
        let pct = per_unit
            .checked_add(net)?
            .checked_add(per_unit.checked_mul(net)? / hundred)?;
        (Some(pct), Some(sku.gp_mass().checked_mul(pct / hundred)?))
    } else {
        (None, None)
    };

    Some(SkuImpact {
        name: sku.name.clone(),
        ownership: sku.ownership,
        price_change_pct: price_change,
        own_volume_change_pct: own_volume_change,
        volume_change_from_others_pct: volume_change_from_others,
        market_contraction_pct: market_contraction,
        volume_impact_pct: net,
        volume_impact_mass_hl: volume_mass,
        rsv_impact_pct: rsv_pct,
        rsv_impact_mass: rsv_mass,
        new_volume_share_pct: new_volume_share,
        volume_share_delta_pp: new_volume_share.checked_sub(sku.volume_share())?,
        new_value_share_pct: new_value_share,
        value_share_delta_pp: new_value_share.checked_sub(sku.value_share())?,
        gp_impact_pct: gp_pct,
        gp_impact_mass: gp_mass,
    })
}

/// Placeholder for a SKU whose impact overflowed: the inputs are echoed and
/// every derived figure is zero.
fn zero_impact(sku: &Sku, price_change: Percent) -> SkuImpact {
    SkuImpact {
        name: sku.name.clone(),
        ownership: sku.ownership,
        price_change_pct: price_change,
        own_volume_change_pct: Decimal::ZERO,
        volume_change_from_others_pct: Decimal::ZERO,
        market_contraction_pct: Decimal::ZERO,
        volume_impact_pct: Decimal::ZERO,
        volume_impact_mass_hl: Decimal::ZERO,
        rsv_impact_pct: Decimal::ZERO,
        rsv_impact_mass: Decimal::ZERO,
        new_volume_share_pct: sku.volume_share(),
        volume_share_delta_pp: Decimal::ZERO,
        new_value_share_pct: sku.value_share(),
        value_share_delta_pp: Decimal::ZERO,
        gp_impact_pct: sku.is_own().then_some(Decimal::ZERO),
        gp_impact_mass: sku.is_own().then_some(Decimal::ZERO),
    }
}

/// Roll owned SKUs up into a portfolio result.
///
/// Percentages are weighted means (volume sold, RSV and GP mass weights);
/// share impacts compare the owned share of the market before and after,
/// with both the owned and the market total moved by the projected impacts.
/// `None` when a weighted sum leaves the `Decimal` range.
pub fn portfolio_impact(
    skus: &[Sku],
    impacts: &[SkuImpact],
    totals: &MarketTotals,
) -> Option<PortfolioImpact> {
    let hundred = dec!(100);
    let owned: Vec<(&Sku, &SkuImpact)> = skus
        .iter()
        .zip(impacts)
        .filter(|(s, _)| s.is_own())
        .collect();

    if owned.is_empty() {
        return Some(PortfolioImpact::default());
    }

    let mut volume_weight = Decimal::ZERO;
    let mut volume_weighted = Decimal::ZERO;
    let mut volume_mass = Decimal::ZERO;
    let mut rsv_weight = Decimal::ZERO;
    let mut rsv_weighted = Decimal::ZERO;
    let mut rsv_mass = Decimal::ZERO;
    let mut gp_weight = Decimal::ZERO;
    let mut gp_weighted = Decimal::ZERO;
    let mut gp_mass = Decimal::ZERO;
    let mut owned_volume_hl = Decimal::ZERO;

    for (sku, impact) in &owned {
        volume_weight = volume_weight.checked_add(sku.volume_sold())?;
        volume_weighted = volume_weighted
            .checked_add(impact.volume_impact_pct.checked_mul(sku.volume_sold())?)?;
        volume_mass = volume_mass.checked_add(impact.volume_impact_mass_hl)?;
        owned_volume_hl = owned_volume_hl.checked_add(sku.volume_sold_hl())?;

        rsv_weight = rsv_weight.checked_add(sku.rsv())?;
        rsv_weighted = rsv_weighted.checked_add(impact.rsv_impact_pct.checked_mul(sku.rsv())?)?;
        rsv_mass = rsv_mass.checked_add(impact.rsv_impact_mass)?;

        let gp_pct = impact.gp_impact_pct.unwrap_or_default();
        gp_weight = gp_weight.checked_add(sku.gp_mass())?;
        gp_weighted = gp_weighted.checked_add(gp_pct.checked_mul(sku.gp_mass())?)?;
        gp_mass = gp_mass.checked_add(impact.gp_impact_mass.unwrap_or_default())?;
    }

    let mut market_volume_mass: Hectoliters = Decimal::ZERO;
    let mut market_rsv_mass: Millions = Decimal::ZERO;
    for i in impacts {
        market_volume_mass = market_volume_mass.checked_add(i.volume_impact_mass_hl)?;
        market_rsv_mass = market_rsv_mass.checked_add(i.rsv_impact_mass)?;
    }

    let current_volume_share =
        checked_ratio(owned_volume_hl, totals.total_volume_sold_hl)?.checked_mul(hundred)?;
    let new_volume_share = checked_ratio(
        owned_volume_hl.checked_add(volume_mass)?,
        totals.total_volume_sold_hl.checked_add(market_volume_mass)?,
    )?
    .checked_mul(hundred)?;

    let current_value_share =
        checked_ratio(rsv_weight, totals.total_rsv_millions)?.checked_mul(hundred)?;
    let new_value_share = checked_ratio(
        rsv_weight.checked_add(rsv_mass)?,
        totals.total_rsv_millions.checked_add(market_rsv_mass)?,
    )?
    .checked_mul(hundred)?;

    Some(PortfolioImpact {
        owned_skus: owned.len(),
        volume_impact_pct: checked_ratio(volume_weighted, volume_weight)?,
        volume_impact_mass_hl: volume_mass,
        rsv_impact_pct: checked_ratio(rsv_weighted, rsv_weight)?,
        rsv_impact_mass: rsv_mass,
        current_volume_share_pct: current_volume_share,
        new_volume_share_pct: new_volume_share,
        volume_share_delta_pp: new_volume_share.checked_sub(current_volume_share)?,
        current_value_share_pct: current_value_share,
        new_value_share_pct: new_value_share,
        value_share_delta_pp: new_value_share.checked_sub(current_value_share)?,
        gp_impact_pct: checked_ratio(gp_weighted, gp_weight)?,
        gp_impact_mass: gp_mass,
    })
}
