use chrono::{Datelike, Local};
use clap::Args;
use serde_json::Value;
use std::collections::HashSet;

use pricing_core::sales_extract::aggregate::{self, SalesExtractInput, SalesRow};
use pricing_core::types::{Ownership, Sku};

use super::load_input;
use crate::input;
use crate::output;

/// Arguments for turning a sales extract into catalog metrics
#[derive(Args)]
pub struct PrepareSalesArgs {
    /// Path to JSON/YAML input (rows, year)
    #[arg(long)]
    pub input: Option<String>,

    /// Sales extract as CSV (date, item, level_1, level_3, pack_size,
    /// unit_size, sales_price_per_unit, sales_units)
    #[arg(long)]
    pub rows: Option<String>,

    /// Calendar year to keep (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Item names owned by us (repeatable); everything else is a competitor
    #[arg(long = "own", value_name = "ITEM")]
    pub own_items: Vec<String>,

    /// Print a SKU catalog ready for --catalog instead of the aggregation report
    #[arg(long)]
    pub as_catalog: bool,
}

pub fn run_prepare_sales(args: PrepareSalesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut extract: SalesExtractInput = match load_input(args.input.as_deref())? {
        Some(i) => i,
        None => {
            let path = args.rows.as_deref().ok_or("--rows is required (or provide --input)")?;
            let rows: Vec<SalesRow> = input::file::read_csv(path)?;
            SalesExtractInput {
                rows,
                year: args.year.unwrap_or_else(|| Local::now().year()),
            }
        }
    };
    if let Some(year) = args.year {
        extract.year = year;
    }

    let result = aggregate::aggregate_sales(&extract)?;
    if !args.as_catalog {
        return Ok(serde_json::to_value(result)?);
    }

    for w in &result.warnings {
        output::warn(w);
    }
    let own: HashSet<&str> = args.own_items.iter().map(String::as_str).collect();
    let skus: Vec<Sku> = result
        .result
        .skus
        .into_iter()
        .map(|agg| {
            let ownership = if own.contains(agg.item.as_str()) {
                Ownership::Own
            } else {
                Ownership::Competitor
            };
            agg.into_sku(ownership)
        })
        .collect();
    Ok(serde_json::to_value(skus)?)
}
