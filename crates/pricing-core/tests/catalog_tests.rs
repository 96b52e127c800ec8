use pricing_core::catalog::analysis_set::AnalysisSet;
use pricing_core::catalog::search::{self, SearchInput, SkuCatalog, SkuFilter};
use pricing_core::pricing::fair_share::{self, FairShareInput, FairShareMatrix, FairShareStatus};
use pricing_core::pricing::impact::{self, ImpactInput};
use pricing_core::types::{Ownership, PriceChanges, Sku, TotalsBasis};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Catalog -> analysis set -> impact, the way a front end drives the engine
// ===========================================================================

fn catalog() -> SkuCatalog {
    let rows = [
        ("Golden Lager 6x330", Ownership::Own, "Beer", "Mainstream", dec!(4000), dec!(40)),
        ("Amber Ale 4x440", Ownership::Own, "Beer", "Premium", dec!(1000), dec!(10)),
        ("Orchard Cider 1L", Ownership::Own, "Cider", "Mainstream", dec!(1500), dec!(15)),
        ("Rival Pils 6x330", Ownership::Competitor, "Beer", "Mainstream", dec!(2500), dec!(25)),
        ("Rival Cider 4x500", Ownership::Competitor, "Cider", "Premium", dec!(1000), dec!(10)),
    ];
    let skus = rows
        .into_iter()
        .map(|(name, ownership, category, segment, volume, share)| Sku {
            category: category.into(),
            segment: segment.into(),
            volume_sold: Some(volume),
            volume_share: Some(share),
            price_elasticity: Some(dec!(-2)),
            rsv: Some(volume / dec!(100)),
            ..Sku::new(name, ownership)
        })
        .collect();
    SkuCatalog::new(skus).unwrap()
}

#[test]
fn test_catalog_totals() {
    let totals = catalog().totals();
    assert_eq!(totals.total_volume_sold_hl, dec!(100));
    assert_eq!(totals.total_rsv_millions, dec!(100));
}

#[test]
fn test_search_then_analyse_beer_only() {
    let cat = catalog();
    let beer = cat.search(&SkuFilter {
        category: Some("Beer".into()),
        ..Default::default()
    });
    let names: Vec<&str> = beer.iter().map(|s| s.name.as_str()).collect();
    let set = AnalysisSet::from_catalog(&cat, &names).unwrap();
    assert_eq!(set.len(), 3);

    let mut price_changes = PriceChanges::new();
    price_changes.insert("Golden Lager 6x330".into(), dec!(10));

    let input = ImpactInput {
        catalog: cat.skus().to_vec(),
        analysis_set: set.skus().to_vec(),
        price_changes,
        fair_share: FairShareMatrix::new(),
        contraction: None,
        totals_basis: TotalsBasis::Catalog,
        market_totals: Some(cat.totals()),
    };
    let out = impact::compute_impacts(&input).unwrap();

    // Lager loses 20% of 40 HL
    let lager = out.result.sku("Golden Lager 6x330").unwrap();
    assert_eq!(lager.volume_impact_pct, dec!(-20));
    assert_eq!(lager.volume_impact_mass_hl, dec!(-8));
    // 32 HL out of a 100 HL market
    assert_eq!(lager.new_volume_share_pct, dec!(32));
    assert_eq!(lager.volume_share_delta_pp, dec!(-8));

    // Pils picks up 40% of Lager's loss: -(0.40 * -20) = 8
    let pils = out.result.sku("Rival Pils 6x330").unwrap();
    assert_eq!(pils.volume_change_from_others_pct, dec!(8));
}

#[test]
fn test_removing_a_sku_changes_the_flow_grid() {
    let cat = catalog();
    let mut set =
        AnalysisSet::from_catalog(&cat, &["Golden Lager 6x330", "Rival Pils 6x330", "Amber Ale 4x440"])
            .unwrap();
    assert!(set.remove("Amber Ale 4x440"));

    let mut fair_share = FairShareMatrix::new();
    fair_share.insert("Golden Lager 6x330", "Rival Pils 6x330", FairShareStatus::AboveFairShare);
    fair_share.insert("Rival Pils 6x330", "Golden Lager 6x330", FairShareStatus::BelowFairShare);

    let out = fair_share::evaluate_fair_share(&FairShareInput {
        skus: set.skus().to_vec(),
        fair_share,
    })
    .unwrap();
    assert_eq!(out.result.cells.len(), 4);
    assert!(out.warnings.is_empty());
    // above: min(37.5, 25 + 0.5*40/1) = 37.5
    assert_eq!(out.result.cells[1].flow_pct, dec!(37.5));
    // below: max(20, 40 - 0.5*25/1) = 27.5
    assert_eq!(out.result.cells[2].flow_pct, dec!(27.5));
    assert_eq!(out.result.cells[0].flow_pct, Decimal::ZERO);
}

#[test]
fn test_search_envelope_echoes_filter() {
    let input = SearchInput {
        catalog: catalog(),
        filter: SkuFilter {
            ownership: Some(Ownership::Own),
            query: Some("CIDER".into()),
            ..Default::default()
        },
    };
    let out = search::search_skus(&input).unwrap();
    assert_eq!(out.result.matched, 1);
    assert_eq!(out.result.skus[0].name, "Orchard Cider 1L");
    assert_eq!(out.assumptions["ownership"], "OWN");
}

#[test]
fn test_catalog_from_sales_extract_csv_headers() {
    let data = "SKU,OWNERSHIP,Level_1,Level_3,volume_sold,rsv\n\
                Golden Lager 6x330, OWN ,Beer,Mainstream,100,2.5\n\
                Rival Pils 6x330,COMPETITOR,Beer,Mainstream,300,\n";
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let skus = rdr
        .deserialize::<Sku>()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let cat = SkuCatalog::new(skus).unwrap();

    let lager = cat.get("Golden Lager 6x330").unwrap();
    assert!(lager.is_own());
    assert_eq!(lager.category, "Beer");
    assert_eq!(lager.segment, "Mainstream");
    assert_eq!(lager.volume_sold, Some(dec!(100)));
    assert_eq!(lager.rsv, Some(dec!(2.5)));

    let pils = cat.get("Rival Pils 6x330").unwrap();
    assert_eq!(pils.ownership, Ownership::Competitor);
    assert_eq!(pils.rsv, None);
    assert_eq!(cat.totals().total_volume_sold_hl, dec!(4));
}
