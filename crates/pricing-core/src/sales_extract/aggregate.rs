use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::sizes::{parse_pack_size, parse_unit_size};
use crate::error::PricingError;
use crate::types::*;
use crate::PricingResult;

/// One line of a retail unit-sales extract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRow {
    pub date: NaiveDate,
    pub item: String,
    /// Category level (e.g. Beer, Cider)
    pub level_1: String,
    /// Segment level (e.g. Premium, Mainstream)
    pub level_3: String,
    /// Free-text pack size, e.g. "6 x"
    pub pack_size: String,
    /// Free-text unit size, e.g. "330ml" or "1.5L"
    pub unit_size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_price_per_unit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_units: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesExtractInput {
    pub rows: Vec<SalesRow>,
    /// Calendar year to keep
    pub year: i32,
}

/// Sales rolled up per item and pack format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSku {
    pub item: String,
    pub level_1: String,
    pub level_3: String,
    pub pack_size: Decimal,
    /// Milliliters or grams
    pub unit_size: Decimal,
    pub average_price_per_unit: Option<Decimal>,
    pub total_sales_units: Decimal,
    /// Pack size x unit size x units, in milliliters or grams
    pub volume_sold: Decimal,
    /// Volume market share as a fraction of the extract total
    pub voms: Decimal,
}

impl AggregatedSku {
    /// Catalog record for the impact engine. Volume is converted from
    /// milliliters to liters and the share to percent.
    pub fn into_sku(self, ownership: Ownership) -> Sku {
        Sku {
            customer_price: self.average_price_per_unit,
            volume_sold: Some(self.volume_sold / dec!(1000)),
            volume_share: Some(self.voms * dec!(100)),
            unit_sold: Some(self.total_sales_units),
            category: self.level_1,
            segment: self.level_3,
            ..Sku::new(self.item, ownership)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesExtractOutput {
    pub skus: Vec<AggregatedSku>,
    pub total_volume: Decimal,
    pub rows_used: usize,
    pub rows_skipped: usize,
}

type GroupKey = (String, String, String, Decimal, Decimal);

#[derive(Default)]
struct Group {
    price_sum: Decimal,
    price_count: u64,
    units: Decimal,
    volume: Decimal,
}

/// Aggregate a sales extract into one record per (item, category, segment,
/// pack size, unit size), keeping only rows dated in `year`.
///
/// Rows whose pack or unit size cannot be parsed are skipped with a warning.
pub fn aggregate_sales(
    input: &SalesExtractInput,
) -> PricingResult<ComputationOutput<SalesExtractOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let in_year: Vec<&SalesRow> = input
        .rows
        .iter()
        .filter(|r| r.date.year() == input.year)
        .collect();
    if in_year.is_empty() {
        return Err(PricingError::InsufficientData(format!(
            "No sales rows dated in {}",
            input.year
        )));
    }

    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in &in_year {
        let (pack, unit) = match (parse_pack_size(&row.pack_size), parse_unit_size(&row.unit_size)) {
            (Some(p), Some(u)) => (p, u),
            _ => {
                skipped += 1;
                warnings.push(format!(
                    "Skipped '{}' on {}: cannot parse pack size '{}' / unit size '{}'",
                    row.item, row.date, row.pack_size, row.unit_size
                ));
                continue;
            }
        };

        let key = (
            row.item.clone(),
            row.level_1.clone(),
            row.level_3.clone(),
            pack,
            unit,
        );
        let group = groups.entry(key).or_default();
        if let Some(price) = row.sales_price_per_unit {
            group.price_sum += price;
            group.price_count += 1;
        }
        if let Some(units) = row.sales_units {
            group.units += units;
            group.volume += pack * unit * units;
        }
    }

    let total_volume: Decimal = groups.values().map(|g| g.volume).sum();
    if total_volume.is_zero() {
        warnings.push("Total volume is zero; VoMS reported as 0".into());
    }

    let skus: Vec<AggregatedSku> = groups
        .into_iter()
        .map(|((item, level_1, level_3, pack_size, unit_size), g)| AggregatedSku {
            item,
            level_1,
            level_3,
            pack_size,
            unit_size,
            average_price_per_unit: if g.price_count == 0 {
                None
            } else {
                Some(g.price_sum / Decimal::from(g.price_count))
            },
            total_sales_units: g.units,
            volume_sold: g.volume,
            voms: ratio_or_zero(g.volume, total_volume),
        })
        .collect();

    let output = SalesExtractOutput {
        skus,
        total_volume,
        rows_used: in_year.len() - skipped,
        rows_skipped: skipped,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sales Extract Aggregation (VoMS)",
        &serde_json::json!({
            "year": input.year,
            "rows_in_extract": input.rows.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
