mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::catalog::SearchArgs;
use commands::contraction::ContractionArgs;
use commands::fair_share::FairShareArgs;
use commands::impact::ImpactArgs;
use commands::market::{MarketImpactArgs, PriceImpactArgs};
use commands::sales::PrepareSalesArgs;

/// Pricing scenario impact calculations
#[derive(Parser)]
#[command(
    name = "psc",
    version,
    about = "Pricing scenario impact calculations",
    long_about = "A CLI for projecting the volume, value and profit impact of price \
                  changes across a SKU portfolio with decimal precision. Combines own \
                  price elasticity, fair-share volume flows between SKUs and a \
                  power-law market contraction."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project per-SKU and portfolio impact of a pricing scenario
    Impact(ImpactArgs),
    /// Evaluate a fair-share matrix and its volume flow percentages
    FairShare(FairShareArgs),
    /// Estimate market contraction from a set of price changes
    Contraction(ContractionArgs),
    /// Own-elasticity impact of a price change on one SKU
    PriceImpact(PriceImpactArgs),
    /// Market-wide elasticity-only impact of several price changes
    MarketImpact(MarketImpactArgs),
    /// Search a SKU catalog
    Search(SearchArgs),
    /// Aggregate a retail sales extract into catalog metrics
    PrepareSales(PrepareSalesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Impact(args) => commands::impact::run_impact(args),
        Commands::FairShare(args) => commands::fair_share::run_fair_share(args),
        Commands::Contraction(args) => commands::contraction::run_contraction(args),
        Commands::PriceImpact(args) => commands::market::run_price_impact(args),
        Commands::MarketImpact(args) => commands::market::run_market_impact(args),
        Commands::Search(args) => commands::catalog::run_search(args),
        Commands::PrepareSales(args) => commands::sales::run_prepare_sales(args),
        Commands::Version => {
            println!("psc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::echo_warnings(&cli.output, &value);
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
