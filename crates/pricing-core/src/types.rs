use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Percentages expressed as whole numbers (10 = 10%). Never as decimals.
pub type Percent = Decimal;

/// Percentage points, an additive difference between two shares.
pub type PercentagePoints = Decimal;

/// Currency amounts reported in millions (RSV, GP mass).
pub type Millions = Decimal;

/// Volumes in liters as reported by the sales extract
pub type Liters = Decimal;

/// Volumes in hectoliters (100 liters)
pub type Hectoliters = Decimal;

/// Price change per SKU name, in percent. Absent names mean no change.
pub type PriceChanges = BTreeMap<String, Percent>;

/// Who owns the SKU. Portfolio rollups only include owned SKUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ownership {
    #[serde(alias = "own", alias = "Own")]
    Own,
    #[default]
    #[serde(alias = "competitor", alias = "Competitor")]
    Competitor,
}

impl Ownership {
    pub fn is_own(&self) -> bool {
        matches!(self, Ownership::Own)
    }
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ownership::Own => write!(f, "OWN"),
            Ownership::Competitor => write!(f, "COMPETITOR"),
        }
    }
}

/// One product/pack in the market.
///
/// Every observed metric is optional; an absent metric reads as zero
/// through the accessor of the same name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    #[serde(alias = "SKU")]
    pub name: String,
    #[serde(default, alias = "OWNERSHIP")]
    pub ownership: Ownership,
    /// Category level of the sales extract (`Level_1`)
    #[serde(default, alias = "Level_1")]
    pub category: String,
    /// Segment level of the sales extract (`Level_3`)
    #[serde(default, alias = "Level_3")]
    pub segment: String,
    /// Pack volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    /// Shelf price paid by the consumer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_price: Option<Decimal>,
    /// Gross profit per hectoliter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gp: Option<Decimal>,
    /// Volume sold over the period, in liters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_sold: Option<Liters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_elasticity: Option<Decimal>,
    /// Price per liter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Retail sales value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsv: Option<Millions>,
    /// Total gross profit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gp_mass: Option<Millions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_share: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_share: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_sold: Option<Decimal>,
}

impl Sku {
    pub fn new(name: impl Into<String>, ownership: Ownership) -> Self {
        Sku {
            name: name.into(),
            ownership,
            ..Default::default()
        }
    }

    pub fn is_own(&self) -> bool {
        self.ownership.is_own()
    }

    pub fn gp(&self) -> Decimal {
        self.gp.unwrap_or_default()
    }

    pub fn volume_sold(&self) -> Liters {
        self.volume_sold.unwrap_or_default()
    }

    pub fn volume_sold_hl(&self) -> Hectoliters {
        self.volume_sold() / dec!(100)
    }

    pub fn price_elasticity(&self) -> Decimal {
        self.price_elasticity.unwrap_or_default()
    }

    pub fn rsv(&self) -> Millions {
        self.rsv.unwrap_or_default()
    }

    pub fn gp_mass(&self) -> Millions {
        self.gp_mass.unwrap_or_default()
    }

    pub fn volume_share(&self) -> Percent {
        self.volume_share.unwrap_or_default()
    }

    pub fn value_share(&self) -> Percent {
        self.value_share.unwrap_or_default()
    }
}

/// Which SKU list feeds the market totals used as share denominators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalsBasis {
    /// Whole market catalog
    #[default]
    Catalog,
    /// Only the SKUs under analysis
    AnalysisSet,
}

impl std::str::FromStr for TotalsBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "catalog" => Ok(TotalsBasis::Catalog),
            "analysis_set" | "analysis" => Ok(TotalsBasis::AnalysisSet),
            other => Err(format!(
                "Unknown totals basis '{other}'. Use: catalog, analysis-set"
            )),
        }
    }
}

/// Pre-summed market aggregates used as share denominators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketTotals {
    pub total_volume_sold_hl: Hectoliters,
    pub total_rsv_millions: Millions,
}

impl MarketTotals {
    pub fn from_skus<'a>(skus: impl IntoIterator<Item = &'a Sku>) -> Self {
        skus.into_iter().fold(MarketTotals::default(), |acc, sku| MarketTotals {
            total_volume_sold_hl: acc.total_volume_sold_hl + sku.volume_sold_hl(),
            total_rsv_millions: acc.total_rsv_millions + sku.rsv(),
        })
    }

    pub fn total_volume_sold(&self) -> Liters {
        self.total_volume_sold_hl * dec!(100)
    }
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Like [`ratio_or_zero`], but `None` when the quotient leaves the `Decimal`
/// range.
pub fn checked_ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        Some(Decimal::ZERO)
    } else {
        numerator.checked_div(denominator)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
