use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::PricingError;
use crate::types::*;
use crate::PricingResult;

/// Power-law market contraction curve `-k * x^n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractionParams {
    /// Contraction coefficient
    pub k: Decimal,
    /// Power exponent
    pub n: Decimal,
}

impl ContractionParams {
    pub fn new(k: Decimal, n: Decimal) -> PricingResult<Self> {
        if k <= Decimal::ZERO {
            return Err(PricingError::InvalidInput {
                field: "k".into(),
                reason: "Contraction coefficient must be positive".into(),
            });
        }
        if n <= Decimal::ZERO {
            return Err(PricingError::InvalidInput {
                field: "n".into(),
                reason: "Power exponent must be positive".into(),
            });
        }
        Ok(ContractionParams { k, n })
    }

    pub fn is_valid(&self) -> bool {
        self.k > Decimal::ZERO && self.n > Decimal::ZERO
    }

    /// Replace both parameters if the new pair is valid. On rejection the
    /// previous pair stays in effect and `false` is returned.
    pub fn update(&mut self, k: Decimal, n: Decimal) -> bool {
        match ContractionParams::new(k, n) {
            Ok(next) => {
                *self = next;
                true
            }
            Err(_) => false,
        }
    }

    /// Like [`update`](Self::update) but for raw user text; non-numeric input
    /// is rejected.
    pub fn update_from_str(&mut self, k: &str, n: &str) -> bool {
        match (Decimal::from_str(k.trim()), Decimal::from_str(n.trim())) {
            (Ok(k), Ok(n)) => self.update(k, n),
            _ => false,
        }
    }
}

/// Volume-weighted price change across the analysed SKUs, as a fraction
/// (0.05 = 5%). Zero when the total volume is zero.
pub fn weighted_price_change(
    skus: &[Sku],
    price_changes: &PriceChanges,
    total_volume_sold: Liters,
) -> Decimal {
    let weighted: Decimal = skus
        .iter()
        .map(|s| {
            let pct = price_changes.get(&s.name).copied().unwrap_or_default();
            pct / dec!(100) * s.volume_sold()
        })
        .sum();
    ratio_or_zero(weighted, total_volume_sold)
}

/// `-k * weighted^n * sign(total_volume_sold)`, in percent.
///
/// `None` when the power is undefined in the reals, i.e. a negative weighted
/// change raised to a fractional exponent, or when the result overflows.
pub fn market_contraction_pct(
    params: &ContractionParams,
    weighted_change: Decimal,
    total_volume_sold: Liters,
) -> Option<Percent> {
    let curve = power(weighted_change, params.n)?;
    let scaled = params.k.checked_mul(curve)?;
    Some(-scaled * sign(total_volume_sold))
}

fn power(base: Decimal, exponent: Decimal) -> Option<Decimal> {
    if base.is_zero() {
        return Some(Decimal::ZERO);
    }
    if exponent.fract().is_zero() {
        return base.checked_powi(exponent.to_i64()?);
    }
    if base.is_sign_negative() {
        return None;
    }
    base.checked_powd(exponent)
}

fn sign(x: Decimal) -> Decimal {
    if x.is_zero() {
        Decimal::ZERO
    } else if x.is_sign_negative() {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    }
}

// ---------------------------------------------------------------------------
// Standalone operation
// ---------------------------------------------------------------------------

/// Input for a market contraction estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractionInput {
    /// SKUs carrying price changes
    pub skus: Vec<Sku>,
    #[serde(default)]
    pub price_changes: PriceChanges,
    pub params: ContractionParams,
    /// Market volume in hectoliters; summed from `skus` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume_sold_hl: Option<Hectoliters>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractionOutput {
    /// Weighted price change as a fraction
    pub weighted_price_change: Decimal,
    pub total_volume_sold_hl: Hectoliters,
    pub market_contraction_pct: Percent,
}

/// Estimate the uniform market-level volume shock of a set of price changes.
pub fn calculate_market_contraction(
    input: &ContractionInput,
) -> PricingResult<ComputationOutput<ContractionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !input.params.is_valid() {
        return Err(PricingError::InvalidInput {
            field: "params".into(),
            reason: "k and n must both be positive".into(),
        });
    }
    for name in input.price_changes.keys() {
        if !input.skus.iter().any(|s| &s.name == name) {
            return Err(PricingError::UnknownSku {
                name: name.clone(),
                context: "price_changes".into(),
            });
        }
    }

    let total_hl = input
        .total_volume_sold_hl
        .unwrap_or_else(|| MarketTotals::from_skus(&input.skus).total_volume_sold_hl);
    let total_volume = total_hl * dec!(100);
    if total_volume.is_zero() {
        warnings.push("Total volume sold is zero; market contraction set to 0".into());
    }

    let weighted = weighted_price_change(&input.skus, &input.price_changes, total_volume);
    let contraction = match market_contraction_pct(&input.params, weighted, total_volume) {
        Some(v) => v,
        None => {
            warnings.push(format!(
                "Weighted price change {weighted} with k = {}, n = {} has no finite \
                 contraction; market contraction set to 0",
                input.params.k, input.params.n
            ));
            Decimal::ZERO
        }
    };

    let output = ContractionOutput {
        weighted_price_change: weighted,
        total_volume_sold_hl: total_hl,
        market_contraction_pct: contraction,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Power-Law Market Contraction",
        &serde_json::json!({
            "k": input.params.k.to_string(),
            "n": input.params.n.to_string(),
            "num_skus": input.skus.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
