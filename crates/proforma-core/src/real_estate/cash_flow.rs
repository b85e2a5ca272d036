use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProFormaError;
use crate::real_estate::amortization::PeriodRecord;
use crate::types::*;
use crate::ProFormaResult;

/// One holding year of the operating projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    pub year: u32,
    /// Net operating income
    pub noi: Money,
    /// Debt service paid in the year (the schedule's payment)
    pub debt_service: Money,
    /// Free cash flow to equity (NOI - debt service), may be negative
    pub free_cash_flow: Money,
    /// NOI / debt service; `None` when there is no debt service
    pub dscr: Option<Multiple>,
    /// Free cash flow / equity invested, when the equity is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_on_cash: Option<Rate>,
}

/// Input for a standalone projection over an existing schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub noi_year_1: Money,
    pub growth_rate: Rate,
    pub schedule: Vec<PeriodRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub yearly: Vec<YearlyCashFlow>,
    pub total_noi: Money,
    pub total_debt_service: Money,
    pub total_free_cash_flow: Money,
}

/// Debt service coverage ratio.
///
/// Fails with `UndefinedResult` when there is no debt service to cover.
pub fn dscr(noi: Money, debt_service: Money) -> ProFormaResult<Multiple> {
    if debt_service.is_zero() {
        return Err(ProFormaError::UndefinedResult {
            metric: "dscr".into(),
            reason: "Debt service is zero".into(),
        });
    }
    noi.checked_div(debt_service)
        .ok_or_else(|| ProFormaError::UndefinedResult {
            metric: "dscr".into(),
            reason: format!("NOI of {noi} over debt service of {debt_service} overflows"),
        })
}

/// Project NOI, debt service, free cash flow and DSCR for every year of
/// the schedule. Year 1 NOI is taken as given; each later year grows by
/// `growth_rate`.
pub fn project(
    noi_year1: Money,
    growth_rate: Rate,
    schedule: &[PeriodRecord],
) -> ProFormaResult<Vec<YearlyCashFlow>> {
    if schedule.is_empty() {
        return Err(ProFormaError::InvalidInput {
            field: "schedule".into(),
            reason: "At least one period is required to project cash flows".into(),
        });
    }
    if growth_rate < -Decimal::ONE {
        return Err(ProFormaError::InvalidInput {
            field: "growth_rate".into(),
            reason: "Growth rate below -100% would flip the sign of NOI".into(),
        });
    }

    let growth = Decimal::ONE + growth_rate;

    let rows = schedule
        .iter()
        .scan(None::<Money>, |prior_noi, period| {
            let noi = match *prior_noi {
                None => noi_year1,
                Some(prev) => prev * growth,
            };
            *prior_noi = Some(noi);

            let debt_service = period.payment;
            Some(YearlyCashFlow {
                year: period.period,
                noi,
                debt_service,
                free_cash_flow: noi - debt_service,
                dscr: dscr(noi, debt_service).ok(),
                cash_on_cash: None,
            })
        })
        .collect();

    Ok(rows)
}

/// Run [`project`] and wrap the rows with totals in the computation envelope.
pub fn project_cash_flows(
    input: &ProjectionInput,
) -> ProFormaResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let yearly = project(input.noi_year_1, input.growth_rate, &input.schedule)?;

    let undefined: Vec<String> = yearly
        .iter()
        .filter(|y| y.dscr.is_none())
        .map(|y| y.year.to_string())
        .collect();
    if !undefined.is_empty() {
        warnings.push(format!(
            "DSCR not available in year(s) {} — no debt service",
            undefined.join(", ")
        ));
    }

    let output = ProjectionOutput {
        total_noi: yearly.iter().map(|y| y.noi).sum(),
        total_debt_service: yearly.iter().map(|y| y.debt_service).sum(),
        total_free_cash_flow: yearly.iter().map(|y| y.free_cash_flow).sum(),
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "NOI Projection and Debt Service Coverage",
        &serde_json::json!({
            "noi_year_1": input.noi_year_1.to_string(),
            "growth_rate": input.growth_rate.to_string(),
            "periods": input.schedule.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
