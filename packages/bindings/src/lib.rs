use napi::Result as NapiResult;
use napi_derive::napi;

use proforma_core::real_estate::{amortization, cash_flow, pro_forma, returns};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pro-forma
// ---------------------------------------------------------------------------

#[napi]
pub fn run_pro_forma(input_json: String) -> NapiResult<String> {
    let input: pro_forma::ProFormaInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pro_forma::run_pro_forma(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[napi]
pub fn build_amortization(input_json: String) -> NapiResult<String> {
    let input: amortization::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::build_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_cash_flows(input_json: String) -> NapiResult<String> {
    let input: cash_flow::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_flow::project_cash_flows(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_returns(input_json: String) -> NapiResult<String> {
    let input: returns::ReturnsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = returns::calculate_returns(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
