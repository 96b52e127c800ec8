use clap::Args;
use serde_json::Value;

use pricing_core::catalog::search::{self, SearchInput, SkuCatalog, SkuFilter};
use pricing_core::types::Ownership;

use super::load_input;
use crate::input;

/// Arguments for catalog search
#[derive(Args)]
pub struct SearchArgs {
    /// Path to JSON/YAML input (catalog, filter)
    #[arg(long)]
    pub input: Option<String>,

    /// Catalog (CSV, JSON or YAML)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Case-insensitive substring of the SKU name
    #[arg(long, short)]
    pub query: Option<String>,

    /// own or competitor
    #[arg(long, value_parser = parse_ownership)]
    pub ownership: Option<Ownership>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub segment: Option<String>,
}

fn parse_ownership(raw: &str) -> Result<Ownership, String> {
    match raw.trim().to_lowercase().as_str() {
        "own" | "owned" => Ok(Ownership::Own),
        "competitor" | "comp" => Ok(Ownership::Competitor),
        other => Err(format!("Unknown ownership '{}'. Use: own, competitor", other)),
    }
}

pub fn run_search(args: SearchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut search_input: SearchInput = match load_input(args.input.as_deref())? {
        Some(i) => i,
        None => SearchInput {
            catalog: SkuCatalog::new(input::file::read_skus(
                args.catalog
                    .as_deref()
                    .ok_or("--catalog is required (or provide --input)")?,
            )?)?,
            filter: SkuFilter::default(),
        },
    };

    let filter = &mut search_input.filter;
    if args.query.is_some() {
        filter.query = args.query;
    }
    if args.ownership.is_some() {
        filter.ownership = args.ownership;
    }
    if args.category.is_some() {
        filter.category = args.category;
    }
    if args.segment.is_some() {
        filter.segment = args.segment;
    }

    let result = search::search_skus(&search_input)?;
    Ok(serde_json::to_value(result)?)
}
