use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use pricing_core::catalog::search::SkuCatalog;
use pricing_core::market::market_impact::{self, MarketImpactInput, PriceChangeRequest};
use pricing_core::market::price_impact::{self, PriceImpactInput};

use super::{load_input, parse_price_change};
use crate::input;

/// Arguments for a single-SKU price impact
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PriceImpactArgs {
    /// Path to JSON/YAML input (sku, price_change_pct)
    #[arg(long)]
    pub input: Option<String>,

    /// Catalog (CSV, JSON or YAML) to look the SKU up in
    #[arg(long)]
    pub catalog: Option<String>,

    /// SKU name
    #[arg(long)]
    pub sku: Option<String>,

    /// Price change in percent (10 = +10%)
    #[arg(long)]
    pub change: Option<Decimal>,
}

/// Arguments for a market-wide, elasticity-only impact
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MarketImpactArgs {
    /// Path to JSON/YAML input (catalog, changes)
    #[arg(long)]
    pub input: Option<String>,

    /// Catalog (CSV, JSON or YAML)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Price change as NAME=PCT (repeatable)
    #[arg(long = "price-change", value_name = "NAME=PCT")]
    pub price_changes: Vec<String>,
}

fn read_catalog(path: &str) -> Result<SkuCatalog, Box<dyn std::error::Error>> {
    Ok(SkuCatalog::new(input::file::read_skus(path)?)?)
}

pub fn run_price_impact(args: PriceImpactArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pi_input: PriceImpactInput = match load_input(args.input.as_deref())? {
        Some(i) => i,
        None => {
            let catalog = read_catalog(
                args.catalog
                    .as_deref()
                    .ok_or("--catalog is required (or provide --input)")?,
            )?;
            let name = args.sku.as_deref().ok_or("--sku is required (or provide --input)")?;
            PriceImpactInput {
                sku: catalog.get(name)?.clone(),
                price_change_pct: args
                    .change
                    .ok_or("--change is required (or provide --input)")?,
            }
        }
    };
    let result = price_impact::calculate_price_impact(&pi_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_market_impact(args: MarketImpactArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mi_input: MarketImpactInput = match load_input(args.input.as_deref())? {
        Some(i) => i,
        None => MarketImpactInput {
            catalog: read_catalog(
                args.catalog
                    .as_deref()
                    .ok_or("--catalog is required (or provide --input)")?,
            )?,
            changes: Vec::new(),
        },
    };
    for raw in &args.price_changes {
        let (sku_name, price_change) = parse_price_change(raw)?;
        mi_input.changes.push(PriceChangeRequest {
            sku_name,
            price_change,
        });
    }
    if mi_input.changes.is_empty() {
        return Err("At least one --price-change is required".into());
    }
    let result = market_impact::analyze_market_impact(&mi_input)?;
    Ok(serde_json::to_value(result)?)
}
