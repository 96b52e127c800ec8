pub mod contraction;
pub mod elasticity;
pub mod fair_share;
pub mod impact;
pub mod volume_flow;

use crate::error::PricingError;
use crate::types::Sku;
use crate::PricingResult;
use fair_share::FairShareMatrix;

/// Every explicit fair-share entry must name two SKUs of `skus`.
pub(crate) fn validate_fair_share_names(matrix: &FairShareMatrix, skus: &[Sku]) -> PricingResult<()> {
    for (from, to, _) in matrix.entries() {
        for name in [from, to] {
            if !skus.iter().any(|s| s.name == name) {
                return Err(PricingError::UnknownSku {
                    name: name.to_string(),
                    context: format!("fair_share entry ({from}, {to})"),
                });
            }
        }
    }
    Ok(())
}
