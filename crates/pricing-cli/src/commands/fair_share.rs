use clap::Args;
use serde_json::Value;

use pricing_core::pricing::fair_share::{self, FairShareInput, FairShareStatus};

use super::load_input;
use crate::input;

/// Arguments for evaluating a fair-share matrix
#[derive(Args)]
pub struct FairShareArgs {
    /// Path to JSON/YAML input (skus, fair_share)
    #[arg(long)]
    pub input: Option<String>,

    /// SKU list (CSV, JSON or YAML) used instead of --input
    #[arg(long)]
    pub skus: Option<String>,

    /// Classification as FROM|TO|STATUS, e.g. "Lager|Pils|above" (repeatable)
    #[arg(long = "set", value_name = "FROM|TO|STATUS")]
    pub classifications: Vec<String>,
}

fn parse_status(raw: &str) -> Result<FairShareStatus, Box<dyn std::error::Error>> {
    match raw.trim().to_lowercase().replace(' ', "_").replace('-', "_").as_str() {
        "above" | "above_fair_share" => Ok(FairShareStatus::AboveFairShare),
        "at" | "at_fair_share" => Ok(FairShareStatus::AtFairShare),
        "below" | "below_fair_share" => Ok(FairShareStatus::BelowFairShare),
        "na" | "n.a." | "not_applicable" => Ok(FairShareStatus::NotApplicable),
        other => Err(format!("Unknown fair-share status '{}'. Use: above, at, below, na", other).into()),
    }
}

fn parse_classification(
    raw: &str,
) -> Result<(String, String, FairShareStatus), Box<dyn std::error::Error>> {
    let parts: Vec<&str> = raw.split('|').collect();
    if parts.len() != 3 {
        return Err(format!("Classification must be FROM|TO|STATUS, got '{}'", raw).into());
    }
    Ok((
        parts[0].trim().to_string(),
        parts[1].trim().to_string(),
        parse_status(parts[2])?,
    ))
}

pub fn run_fair_share(args: FairShareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut fs_input: FairShareInput = match load_input(args.input.as_deref())? {
        Some(i) => i,
        None => FairShareInput {
            skus: input::file::read_skus(
                args.skus.as_deref().ok_or("--skus is required (or provide --input)")?,
            )?,
            fair_share: Default::default(),
        },
    };

    for raw in &args.classifications {
        let (from, to, status) = parse_classification(raw)?;
        fs_input.fair_share.insert(&from, &to, status);
    }

    let result = fair_share::evaluate_fair_share(&fs_input)?;
    Ok(serde_json::to_value(result)?)
}
