use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProFormaError;
use crate::real_estate::amortization::{self, PeriodRecord};
use crate::real_estate::cash_flow::{self, YearlyCashFlow};
use crate::real_estate::returns::{self, ReturnSummary};
use crate::time_value::IrrOutcome;
use crate::types::*;
use crate::ProFormaResult;

const DSCR_COVENANT_FLOOR: Decimal = dec!(1.20);
const HIGH_LTV: Decimal = dec!(0.80);

fn default_hold_period() -> u32 {
    10
}

/// Acquisition, operating and financing assumptions for a single asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProFormaInput {
    /// Acquisition price
    pub purchase_price: Money,
    /// Net operating income in the first year of ownership
    pub noi_year_1: Money,
    /// Annual NOI growth applied from year 2 onwards
    pub revenue_growth: Rate,
    /// Cap rate applied to terminal-year NOI at sale
    pub exit_cap_rate: Rate,
    /// Loan-to-value at acquisition (0.60 = 60%)
    pub ltv: Rate,
    /// Annual interest rate on the acquisition loan
    pub interest_rate: Rate,
    /// Amortisation term in years (annual payments)
    pub amortization_years: u32,
    /// Holding period in years; sale at the end of the final year
    #[serde(default = "default_hold_period")]
    pub hold_period_years: u32,
}

/// Complete pro-forma: financing, yearly table and investor returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProFormaOutput {
    pub loan_amount: Money,
    pub equity_required: Money,
    /// Year-1 NOI / purchase price
    pub going_in_cap_rate: Rate,
    pub annual_debt_service: Money,
    pub schedule: Vec<PeriodRecord>,
    pub yearly: Vec<YearlyCashFlow>,
    /// Lowest DSCR over the hold; `None` when any year has no debt service
    pub minimum_dscr: Option<Multiple>,
    pub returns: ReturnSummary,
}

/// Run the full model: amortisation, operating projection, exit and returns.
pub fn run_pro_forma(
    input: &ProFormaInput,
) -> ProFormaResult<ComputationOutput<ProFormaOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, &mut warnings)?;

    let loan_amount = input.purchase_price * input.ltv;
    let equity_required = input.purchase_price - loan_amount;
    let going_in_cap_rate = input
        .noi_year_1
        .checked_div(input.purchase_price)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price is too small relative to NOI".into(),
        })?;

    log::debug!(
        "pro forma: loan {loan_amount}, equity {equity_required}, hold {} years",
        input.hold_period_years
    );

    // --- Debt ---
    let schedule = amortization::build_schedule(
        loan_amount,
        input.interest_rate,
        input.amortization_years,
        input.hold_period_years,
    )?;
    let annual_debt_service = schedule.first().map(|p| p.payment).unwrap_or(Decimal::ZERO);

    // --- Operations ---
    let yearly: Vec<YearlyCashFlow> =
        cash_flow::project(input.noi_year_1, input.revenue_growth, &schedule)?
            .into_iter()
            .map(|row| YearlyCashFlow {
                cash_on_cash: row.free_cash_flow.checked_div(equity_required),
                ..row
            })
            .collect();

    // --- Exit and returns ---
    let final_noi = yearly.last().map(|y| y.noi).unwrap_or(input.noi_year_1);
    let remaining_balance = schedule
        .last()
        .map(|p| p.ending_balance)
        .unwrap_or(loan_amount);

    let summary = returns::summarize(
        equity_required,
        &yearly,
        final_noi,
        input.exit_cap_rate,
        remaining_balance,
    )?;

    let minimum_dscr = yearly
        .iter()
        .map(|y| y.dscr)
        .collect::<Option<Vec<_>>>()
        .and_then(|v| v.into_iter().min());

    collect_warnings(input, &yearly, &summary, going_in_cap_rate, &mut warnings);

    let output = ProFormaOutput {
        loan_amount,
        equity_required,
        going_in_cap_rate,
        annual_debt_service,
        schedule,
        yearly,
        minimum_dscr,
        returns: summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CRE Pro-Forma (Levered Hold, Direct-Cap Exit)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &ProFormaInput, warnings: &mut Vec<String>) -> ProFormaResult<()> {
    if input.purchase_price <= Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price must be positive".into(),
        });
    }
    if input.ltv < Decimal::ZERO || input.ltv >= Decimal::ONE {
        return Err(ProFormaError::InvalidInput {
            field: "ltv".into(),
            reason: "LTV must be between 0 and 1 (exclusive upper) so that equity is positive"
                .into(),
        });
    }
    if input.exit_cap_rate <= Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "exit_cap_rate".into(),
            reason: "Exit cap rate must be positive".into(),
        });
    }
    if input.hold_period_years == 0 {
        return Err(ProFormaError::InvalidInput {
            field: "hold_period_years".into(),
            reason: "Holding period must be at least 1 year".into(),
        });
    }

    if input.ltv > HIGH_LTV {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80% — high leverage",
            input.ltv * dec!(100)
        ));
    }
    if input.amortization_years < input.hold_period_years {
        warnings.push(format!(
            "Loan fully amortises in year {} before the {}-year hold ends",
            input.amortization_years, input.hold_period_years
        ));
    }
    if input.noi_year_1 <= Decimal::ZERO {
        warnings.push("Year-1 NOI is not positive — exit value will not be positive".into());
    }

    Ok(())
}

fn collect_warnings(
    input: &ProFormaInput,
    yearly: &[YearlyCashFlow],
    returns: &ReturnSummary,
    going_in_cap_rate: Rate,
    warnings: &mut Vec<String>,
) {
    for y in yearly {
        if let Some(d) = y.dscr {
            if d < DSCR_COVENANT_FLOOR {
                warnings.push(format!(
                    "Year {}: DSCR of {d:.2} is below 1.20x — lender covenant risk",
                    y.year
                ));
            }
        }
    }

    let negative_years: Vec<String> = yearly
        .iter()
        .filter(|y| y.free_cash_flow < Decimal::ZERO)
        .map(|y| y.year.to_string())
        .collect();
    if !negative_years.is_empty() {
        warnings.push(format!(
            "Negative cash flow to equity in year(s) {}",
            negative_years.join(", ")
        ));
    }

    if returns.net_sale_proceeds < Decimal::ZERO {
        warnings.push("Loan balance exceeds exit value — net sale proceeds are negative".into());
    }

    if input.exit_cap_rate < going_in_cap_rate {
        warnings.push(format!(
            "Exit cap rate {} is below the going-in cap rate {going_in_cap_rate:.4} — assumes cap-rate compression",
            input.exit_cap_rate
        ));
    }

    if let IrrOutcome::Undefined { reason } = &returns.irr {
        warnings.push(format!("IRR not available: {reason}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> ProFormaInput {
        ProFormaInput {
            purchase_price: dec!(10000000),
            noi_year_1: dec!(750000),
            revenue_growth: dec!(0.02),
            exit_cap_rate: dec!(0.06),
            ltv: dec!(0.6),
            interest_rate: dec!(0.06),
            amortization_years: 30,
            hold_period_years: 10,
        }
    }

    #[test]
    fn test_acquisition_summary() {
        let out = run_pro_forma(&base_input()).unwrap().result;
        assert_eq!(out.loan_amount, dec!(6000000));
        assert_eq!(out.equity_required, dec!(4000000));
        assert_eq!(out.going_in_cap_rate, dec!(0.075));
        assert_eq!(out.schedule.len(), 10);
        assert_eq!(out.yearly.len(), 10);
    }

    #[test]
    fn test_returns_wired_from_components() {
        let out = run_pro_forma(&base_input()).unwrap().result;
        let last = out.yearly.last().unwrap();
        assert_eq!(out.returns.exit_value, last.noi / dec!(0.06));
        assert_eq!(
            out.returns.net_sale_proceeds,
            out.returns.exit_value - out.schedule[9].ending_balance
        );
        assert_eq!(out.returns.equity_cash_flows[0], dec!(-4000000));
        assert!(out.returns.irr.is_defined());
        assert!(out.returns.equity_multiple > Decimal::ONE);
    }

    #[test]
    fn test_cash_on_cash_populated() {
        let out = run_pro_forma(&base_input()).unwrap().result;
        for y in &out.yearly {
            assert_eq!(y.cash_on_cash, Some(y.free_cash_flow / dec!(4000000)));
        }
    }

    #[test]
    fn test_minimum_dscr() {
        let out = run_pro_forma(&base_input()).unwrap().result;
        // NOI grows, debt service is level: year 1 is the tightest
        assert_eq!(out.minimum_dscr, out.yearly[0].dscr);
    }

    #[test]
    fn test_all_equity_deal() {
        let mut input = base_input();
        input.ltv = Decimal::ZERO;
        let out = run_pro_forma(&input).unwrap();
        let res = &out.result;
        assert_eq!(res.loan_amount, Decimal::ZERO);
        assert_eq!(res.annual_debt_service, Decimal::ZERO);
        assert!(res.yearly.iter().all(|y| y.dscr.is_none()));
        assert_eq!(res.minimum_dscr, None);
        // DSCR being undefined must not suppress the returns
        assert!(res.returns.irr.is_defined());
    }

    #[test]
    fn test_default_hold_period_from_json() {
        let json = r#"{
            "purchase_price": "10000000",
            "noi_year_1": "750000",
            "revenue_growth": "0.02",
            "exit_cap_rate": "0.06",
            "ltv": "0.6",
            "interest_rate": "0.06",
            "amortization_years": 30
        }"#;
        let input: ProFormaInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.hold_period_years, 10);
    }

    #[test]
    fn test_warnings() {
        let mut input = base_input();
        input.ltv = dec!(0.85);
        input.interest_rate = dec!(0.10);
        input.exit_cap_rate = dec!(0.05);
        let out = run_pro_forma(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("LTV")));
        assert!(out.warnings.iter().any(|w| w.contains("DSCR")));
        assert!(out.warnings.iter().any(|w| w.contains("compression")));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = base_input();
        input.ltv = Decimal::ONE;
        assert!(run_pro_forma(&input).is_err());

        let mut input = base_input();
        input.purchase_price = Decimal::ZERO;
        assert!(run_pro_forma(&input).is_err());

        let mut input = base_input();
        input.exit_cap_rate = Decimal::ZERO;
        assert!(run_pro_forma(&input).is_err());

        let mut input = base_input();
        input.hold_period_years = 0;
        assert!(run_pro_forma(&input).is_err());

        let mut input = base_input();
        input.amortization_years = 0;
        assert!(run_pro_forma(&input).is_err());
    }
}
