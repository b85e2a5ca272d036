use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProFormaError;
use crate::real_estate::cash_flow::YearlyCashFlow;
use crate::time_value::{self, IrrOutcome};
use crate::types::*;
use crate::ProFormaResult;

/// Input for a standalone return calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsInput {
    /// Equity invested at t = 0
    pub equity: Money,
    /// Free cash flow to equity for each holding year
    pub free_cash_flows: Vec<Money>,
    /// NOI of the final holding year
    pub final_noi: Money,
    pub exit_cap_rate: Rate,
    /// Loan balance repaid from sale proceeds
    #[serde(default)]
    pub remaining_balance: Money,
}

/// Exit and investor return metrics for the holding period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSummary {
    /// Terminal-year NOI capitalised at the exit cap rate
    pub exit_value: Money,
    /// Exit value less the loan payoff; negative when the loan is under water
    pub net_sale_proceeds: Money,
    /// t = 0 equity outlay followed by one flow per holding year, the last
    /// including net sale proceeds
    pub equity_cash_flows: Vec<Money>,
    pub irr: IrrOutcome,
    /// Sum of flows after t = 0 divided by equity
    pub equity_multiple: Multiple,
    pub total_distributions: Money,
    /// Total distributions less equity invested
    pub profit: Money,
}

/// Direct capitalisation of a single year's NOI.
pub fn exit_value(final_noi: Money, exit_cap_rate: Rate) -> ProFormaResult<Money> {
    if exit_cap_rate <= Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "exit_cap_rate".into(),
            reason: "Exit cap rate must be positive".into(),
        });
    }
    final_noi
        .checked_div(exit_cap_rate)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "exit_cap_rate".into(),
            reason: format!("Exit cap rate {exit_cap_rate} is too small to capitalise NOI of {final_noi}"),
        })
}

/// Compute exit proceeds and investor returns.
///
/// An IRR that cannot be found is reported in `irr` and never suppresses the
/// other metrics.
pub fn summarize(
    equity: Money,
    cashflows: &[YearlyCashFlow],
    final_noi: Money,
    exit_cap_rate: Rate,
    remaining_balance: Money,
) -> ProFormaResult<ReturnSummary> {
    let free_cash_flows: Vec<Money> = cashflows.iter().map(|cf| cf.free_cash_flow).collect();
    summarize_flows(
        equity,
        &free_cash_flows,
        final_noi,
        exit_cap_rate,
        remaining_balance,
    )
}

/// [`summarize`] over bare free-cash-flow amounts.
pub fn summarize_flows(
    equity: Money,
    free_cash_flows: &[Money],
    final_noi: Money,
    exit_cap_rate: Rate,
    remaining_balance: Money,
) -> ProFormaResult<ReturnSummary> {
    if equity <= Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "equity".into(),
            reason: "Equity invested must be positive".into(),
        });
    }
    if free_cash_flows.is_empty() {
        return Err(ProFormaError::InvalidInput {
            field: "cashflows".into(),
            reason: "At least one holding year is required".into(),
        });
    }

    let exit_value = exit_value(final_noi, exit_cap_rate)?;
    let net_sale_proceeds = exit_value - remaining_balance;

    let last = free_cash_flows.len() - 1;
    let equity_cash_flows: Vec<Money> = std::iter::once(-equity)
        .chain(free_cash_flows.iter().enumerate().map(|(i, cf)| {
            if i == last {
                *cf + net_sale_proceeds
            } else {
                *cf
            }
        }))
        .collect();

    let irr = time_value::irr(&equity_cash_flows);
    if let IrrOutcome::Undefined { reason } = &irr {
        log::debug!("IRR undefined: {reason}");
    }

    let total_distributions: Money = equity_cash_flows[1..].iter().copied().sum();
    let equity_multiple = total_distributions
        .checked_div(equity)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "equity".into(),
            reason: format!("Equity {equity} is too small to compute an equity multiple"),
        })?;

    Ok(ReturnSummary {
        exit_value,
        net_sale_proceeds,
        equity_cash_flows,
        irr,
        equity_multiple,
        total_distributions,
        profit: total_distributions - equity,
    })
}

/// Run [`summarize_flows`] and wrap it in the computation envelope.
pub fn calculate_returns(
    input: &ReturnsInput,
) -> ProFormaResult<ComputationOutput<ReturnSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let summary = summarize_flows(
        input.equity,
        &input.free_cash_flows,
        input.final_noi,
        input.exit_cap_rate,
        input.remaining_balance,
    )?;

    if summary.net_sale_proceeds < Decimal::ZERO {
        warnings.push("Loan balance exceeds exit value — net sale proceeds are negative".into());
    }
    if let IrrOutcome::Undefined { reason } = &summary.irr {
        warnings.push(format!("IRR not available: {reason}"));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equity Returns (IRR, Equity Multiple, Direct-Cap Exit)",
        input,
        warnings,
        elapsed,
        summary,
    ))
}
