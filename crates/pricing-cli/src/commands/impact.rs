use clap::Args;
use serde_json::Value;

use pricing_core::pricing::impact::{self, ImpactInput};
use pricing_core::types::TotalsBasis;

use super::contraction::apply_contraction_flags;
use super::{load_input, parse_price_change, push_warning};
use crate::input;

/// Arguments for the full scenario impact
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ImpactArgs {
    /// Path to JSON/YAML scenario (catalog, analysis_set, price_changes,
    /// fair_share, contraction)
    #[arg(long)]
    pub input: Option<String>,

    /// Market catalog (CSV, JSON or YAML); replaces the scenario's catalog
    #[arg(long)]
    pub catalog: Option<String>,

    /// Analysis set (CSV, JSON or YAML); replaces the scenario's analysis set
    #[arg(long)]
    pub analysis_set: Option<String>,

    /// Price change as NAME=PCT (repeatable)
    #[arg(long = "price-change", value_name = "NAME=PCT")]
    pub price_changes: Vec<String>,

    /// Contraction coefficient k
    #[arg(long)]
    pub k: Option<String>,

    /// Power exponent n
    #[arg(long)]
    pub n: Option<String>,

    /// Which SKUs feed market totals: catalog, analysis-set
    #[arg(long)]
    pub totals_basis: Option<TotalsBasis>,
}

pub fn run_impact(args: ImpactArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut impact_input: ImpactInput = match load_input(args.input.as_deref())? {
        Some(i) => i,
        None => ImpactInput {
            catalog: Vec::new(),
            analysis_set: input::file::read_skus(
                args.analysis_set
                    .as_deref()
                    .ok_or("--analysis-set is required (or provide --input)")?,
            )?,
            price_changes: Default::default(),
            fair_share: Default::default(),
            contraction: None,
            totals_basis: TotalsBasis::default(),
            market_totals: None,
        },
    };

    if let Some(ref path) = args.catalog {
        impact_input.catalog = input::file::read_skus(path)?;
    }
    if args.input.is_some() {
        if let Some(ref path) = args.analysis_set {
            impact_input.analysis_set = input::file::read_skus(path)?;
        }
    }
    for raw in &args.price_changes {
        let (name, pct) = parse_price_change(raw)?;
        impact_input.price_changes.insert(name, pct);
    }
    if let Some(basis) = args.totals_basis {
        impact_input.totals_basis = basis;
    }
    let (contraction, note) =
        apply_contraction_flags(impact_input.contraction, args.k.as_deref(), args.n.as_deref())?;
    impact_input.contraction = contraction;

    let result = impact::compute_impacts(&impact_input)?;
    let mut value = serde_json::to_value(result)?;
    if let Some(note) = note {
        push_warning(&mut value, note);
    }
    Ok(value)
}
