use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use pricing_core::pricing::contraction::ContractionParams;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Scenario impact
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_impacts(input_json: String) -> NapiResult<String> {
    let input: pricing_core::pricing::impact::ImpactInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        pricing_core::pricing::impact::compute_impacts(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn fair_share_flows(input_json: String) -> NapiResult<String> {
    let input: pricing_core::pricing::fair_share::FairShareInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing_core::pricing::fair_share::evaluate_fair_share(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ContractionUpdate {
    current: ContractionParams,
    k: String,
    n: String,
}

#[derive(Serialize)]
struct ContractionUpdateResult {
    params: ContractionParams,
    accepted: bool,
}

/// Validate raw k / n text from the front end. A rejected pair leaves
/// `current` in effect and reports `accepted: false`.
#[napi]
pub fn update_contraction(input_json: String) -> NapiResult<String> {
    let update: ContractionUpdate = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let mut params = update.current;
    let accepted = params.update_from_str(&update.k, &update.n);
    serde_json::to_string(&ContractionUpdateResult { params, accepted }).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Elasticity-only market views
// ---------------------------------------------------------------------------

#[napi]
pub fn price_impact(input_json: String) -> NapiResult<String> {
    let input: pricing_core::market::price_impact::PriceImpactInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing_core::market::price_impact::calculate_price_impact(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn market_impact(input_json: String) -> NapiResult<String> {
    let input: pricing_core::market::market_impact::MarketImpactInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing_core::market::market_impact::analyze_market_impact(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[napi]
pub fn search_skus(input_json: String) -> NapiResult<String> {
    let input: pricing_core::catalog::search::SearchInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        pricing_core::catalog::search::search_skus(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn prepare_sales(input_json: String) -> NapiResult<String> {
    let input: pricing_core::sales_extract::aggregate::SalesExtractInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing_core::sales_extract::aggregate::aggregate_sales(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
