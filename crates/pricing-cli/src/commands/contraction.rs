use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Instant;

use pricing_core::pricing::contraction::{
    self, ContractionInput, ContractionOutput, ContractionParams,
};
use pricing_core::types::with_metadata;

use super::{load_input, parse_price_change, push_warning};
use crate::input;

/// Arguments for a market contraction estimate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ContractionArgs {
    /// Path to JSON/YAML input (skus, price_changes, params)
    #[arg(long)]
    pub input: Option<String>,

    /// SKU list (CSV, JSON or YAML) used instead of --input
    #[arg(long)]
    pub skus: Option<String>,

    /// Price change as NAME=PCT (repeatable)
    #[arg(long = "price-change", value_name = "NAME=PCT")]
    pub price_changes: Vec<String>,

    /// Contraction coefficient k (must be positive)
    #[arg(long)]
    pub k: Option<String>,

    /// Power exponent n (must be positive)
    #[arg(long)]
    pub n: Option<String>,

    /// Market volume in hectoliters; summed from the SKUs when absent
    #[arg(long)]
    pub total_volume_hl: Option<Decimal>,

    /// Evaluate the curve directly at this weighted price change (fraction)
    #[arg(long)]
    pub weighted_change: Option<Decimal>,
}

/// Apply `--k` / `--n` on top of `current`.
///
/// With a current pair, a rejected update keeps it and returns a note. Without
/// one, both flags are required and must be valid.
pub(crate) fn apply_contraction_flags(
    current: Option<ContractionParams>,
    k: Option<&str>,
    n: Option<&str>,
) -> Result<(Option<ContractionParams>, Option<String>), Box<dyn std::error::Error>> {
    if k.is_none() && n.is_none() {
        return Ok((current, None));
    }
    match current {
        Some(mut params) => {
            let k_text = k.map(str::to_string).unwrap_or_else(|| params.k.to_string());
            let n_text = n.map(str::to_string).unwrap_or_else(|| params.n.to_string());
            if params.update_from_str(&k_text, &n_text) {
                Ok((Some(params), None))
            } else {
                let note = format!(
                    "Rejected k = '{}', n = '{}'; keeping k = {}, n = {}",
                    k_text, n_text, params.k, params.n
                );
                Ok((Some(params), Some(note)))
            }
        }
        None => {
            let k: Decimal = k
                .ok_or("--k is required when the input has no contraction parameters")?
                .trim()
                .parse()
                .map_err(|_| "--k must be a number")?;
            let n: Decimal = n
                .ok_or("--n is required when the input has no contraction parameters")?
                .trim()
                .parse()
                .map_err(|_| "--n must be a number")?;
            Ok((Some(ContractionParams::new(k, n)?), None))
        }
    }
}

pub fn run_contraction(args: ContractionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(weighted) = args.weighted_change {
        let start = Instant::now();
        let (params, _) = apply_contraction_flags(None, args.k.as_deref(), args.n.as_deref())?;
        let params = params.ok_or("--k and --n are required")?;
        let total_hl = args.total_volume_hl.unwrap_or(Decimal::ONE);
        let pct = contraction::market_contraction_pct(&params, weighted, total_hl).ok_or_else(
            || {
                format!(
                    "Weighted price change {} with k = {}, n = {} has no finite contraction",
                    weighted, params.k, params.n
                )
            },
        )?;
        let output = ContractionOutput {
            weighted_price_change: weighted,
            total_volume_sold_hl: total_hl,
            market_contraction_pct: pct,
        };
        let result = with_metadata(
            "Power-Law Market Contraction",
            &json!({ "k": params.k.to_string(), "n": params.n.to_string() }),
            Vec::new(),
            start.elapsed().as_micros() as u64,
            output,
        );
        return Ok(serde_json::to_value(result)?);
    }

    let mut contraction_input: ContractionInput =
        match load_input::<ContractionInput>(args.input.as_deref())? {
            Some(i) => i,
            None => {
                let path = args
                    .skus
                    .as_deref()
                    .ok_or("--skus is required (or provide --input)")?;
                let (params, _) =
                    apply_contraction_flags(None, args.k.as_deref(), args.n.as_deref())?;
                ContractionInput {
                    skus: input::file::read_skus(path)?,
                    price_changes: Default::default(),
                    params: params.ok_or("--k and --n are required (or provide --input)")?,
                    total_volume_sold_hl: None,
                }
            }
        };

    for raw in &args.price_changes {
        let (name, pct) = parse_price_change(raw)?;
        contraction_input.price_changes.insert(name, pct);
    }
    if args.total_volume_hl.is_some() {
        contraction_input.total_volume_sold_hl = args.total_volume_hl;
    }
    let (params, note) = apply_contraction_flags(
        Some(contraction_input.params),
        args.k.as_deref(),
        args.n.as_deref(),
    )?;
    if let Some(p) = params {
        contraction_input.params = p;
    }

    let result = contraction::calculate_market_contraction(&contraction_input)?;
    let mut value = serde_json::to_value(result)?;
    if let Some(note) = note {
        push_warning(&mut value, note);
    }
    Ok(value)
}
