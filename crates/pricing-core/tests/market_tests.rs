#![cfg(all(feature = "market", feature = "sales_extract"))]

use chrono::NaiveDate;
use pricing_core::catalog::search::SkuCatalog;
use pricing_core::market::market_impact::{self, MarketImpactInput, PriceChangeRequest};
use pricing_core::market::price_impact::{self, PriceImpactInput};
use pricing_core::sales_extract::aggregate::{self, SalesExtractInput, SalesRow};
use pricing_core::types::Ownership;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Sales extract -> catalog -> elasticity-only market impact
// ===========================================================================

fn extract() -> SalesExtractInput {
    let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    let row = |item: &str, pack: &str, unit: &str, price: Decimal, units: Decimal| SalesRow {
        date,
        item: item.into(),
        level_1: "Beer".into(),
        level_3: "Mainstream".into(),
        pack_size: pack.into(),
        unit_size: unit.into(),
        sales_price_per_unit: Some(price),
        sales_units: Some(units),
    };
    SalesExtractInput {
        rows: vec![
            row("Golden Lager", "6 x", "330ml", dec!(7.50), dec!(1000)),
            row("Rival Pils", "4 x", "500ml", dec!(6.00), dec!(1010)),
        ],
        year: 2025,
    }
}

fn catalog_from_extract() -> SkuCatalog {
    let out = aggregate::aggregate_sales(&extract()).unwrap().result;
    let skus = out
        .skus
        .into_iter()
        .map(|agg| {
            let ownership = if agg.item.starts_with("Golden") {
                Ownership::Own
            } else {
                Ownership::Competitor
            };
            let mut sku = agg.into_sku(ownership);
            sku.price_elasticity = Some(dec!(-2));
            sku
        })
        .collect();
    SkuCatalog::new(skus).unwrap()
}

#[test]
fn test_extract_volumes_become_liters() {
    let cat = catalog_from_extract();
    // 6 * 330 * 1000 ml = 1980 L
    assert_eq!(cat.get("Golden Lager").unwrap().volume_sold, Some(dec!(1980)));
    // 4 * 500 * 1010 ml = 2020 L
    assert_eq!(cat.get("Rival Pils").unwrap().volume_sold, Some(dec!(2020)));
    assert_eq!(cat.totals().total_volume_sold_hl, dec!(40));
}

#[test]
fn test_single_sku_price_impact_from_extract() {
    let cat = catalog_from_extract();
    let input = PriceImpactInput {
        sku: cat.get("Golden Lager").unwrap().clone(),
        price_change_pct: dec!(10),
    };
    let out = price_impact::calculate_price_impact(&input).unwrap();
    assert_eq!(out.result.new_price, dec!(8.25));
    // 1980 * (1 - 0.2)
    assert_eq!(out.result.new_volume, dec!(1584));
    assert_eq!(out.result.volume_change_pct, dec!(-20.0));
}

#[test]
fn test_market_impact_from_extract() {
    let input = MarketImpactInput {
        catalog: catalog_from_extract(),
        changes: vec![PriceChangeRequest {
            sku_name: "Golden Lager".into(),
            price_change: dec!(10),
        }],
    };
    let out = market_impact::analyze_market_impact(&input).unwrap().result;
    // volume 4000 -> 3604
    assert_eq!(out.market_volume_change_pct, dec!(-9.9));
    let shares: Decimal = out.new_market_shares.iter().map(|s| s.volume_share).sum();
    assert!((shares - dec!(100)).abs() <= dec!(0.1));
}
