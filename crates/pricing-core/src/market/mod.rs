pub mod market_impact;
pub mod price_impact;
