use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProFormaError;
use crate::time_value;
use crate::types::*;
use crate::ProFormaResult;

/// Fixed-rate, fully amortising loan terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Loan principal at origination
    pub principal: Money,
    /// Interest rate per period (annual rate for annual periods)
    pub rate: Rate,
    /// Number of periods over which the loan fully amortises
    pub amortization_periods: u32,
    /// Number of periods to report (e.g. a 10-year hold on a 30-year amortisation)
    pub horizon_periods: u32,
}

/// A single period in the amortisation schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: u32,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// Schedule plus totals over the reporting horizon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payment: Money,
    pub periods: Vec<PeriodRecord>,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Balance outstanding after the last reported period
    pub balance_at_horizon: Money,
}

impl LoanTerms {
    pub fn schedule(&self) -> ProFormaResult<Vec<PeriodRecord>> {
        build_schedule(
            self.principal,
            self.rate,
            self.amortization_periods,
            self.horizon_periods,
        )
    }
}

/// Constant payment that retires `principal` over `amortization_periods`.
pub fn periodic_payment(
    principal: Money,
    rate: Rate,
    amortization_periods: u32,
) -> ProFormaResult<Money> {
    validate_terms(principal, rate, amortization_periods, 1)?;

    if rate.is_zero() {
        return Ok(principal / Decimal::from(amortization_periods));
    }

    Ok(-time_value::pmt(rate, amortization_periods, principal, Decimal::ZERO)?)
}

/// Build the period-by-period schedule for a fixed-rate loan.
///
/// Each period charges interest on the opening balance; the rest of the
/// payment retires principal. The payment is the same in every period and
/// balances are floored at zero, so periods past the amortisation term
/// charge no interest.
pub fn build_schedule(
    principal: Money,
    rate: Rate,
    amortization_periods: u32,
    horizon_periods: u32,
) -> ProFormaResult<Vec<PeriodRecord>> {
    validate_terms(principal, rate, amortization_periods, horizon_periods)?;

    let payment = periodic_payment(principal, rate, amortization_periods)?;

    let periods = (1..=horizon_periods)
        .scan(principal, |balance, period| {
            let opening = *balance;
            let interest = opening * rate;
            let principal_paid = payment - interest;
            let ending = (opening - principal_paid).max(Decimal::ZERO);
            *balance = ending;
            Some(PeriodRecord {
                period,
                opening_balance: opening,
                payment,
                interest,
                principal: principal_paid,
                ending_balance: ending,
            })
        })
        .collect();

    Ok(periods)
}

/// Build the schedule and its totals, wrapped in the computation envelope.
pub fn build_amortization(
    terms: &LoanTerms,
) -> ProFormaResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let periods = terms.schedule()?;
    let payment = periodic_payment(terms.principal, terms.rate, terms.amortization_periods)?;

    let total_interest: Money = periods.iter().map(|p| p.interest).sum();
    let total_principal: Money = periods.iter().map(|p| p.principal).sum();
    let balance_at_horizon = periods
        .last()
        .map(|p| p.ending_balance)
        .unwrap_or(terms.principal);

    if terms.horizon_periods > terms.amortization_periods {
        warnings.push(format!(
            "Horizon of {} periods runs past the {}-period amortisation; the level payment continues after the loan is retired",
            terms.horizon_periods, terms.amortization_periods
        ));
    }

    log::debug!(
        "amortisation: {} periods, payment {payment}, balance at horizon {balance_at_horizon}",
        periods.len()
    );

    let output = AmortizationSchedule {
        payment,
        periods,
        total_interest,
        total_principal,
        balance_at_horizon,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Rate Loan Amortisation (Level Payment)",
        terms,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_terms(
    principal: Money,
    rate: Rate,
    amortization_periods: u32,
    horizon_periods: u32,
) -> ProFormaResult<()> {
    if principal < Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal cannot be negative".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if amortization_periods == 0 {
        return Err(ProFormaError::InvalidInput {
            field: "amortization_periods".into(),
            reason: "Amortisation term must be at least 1 period".into(),
        });
    }
    if horizon_periods == 0 {
        return Err(ProFormaError::InvalidInput {
            field: "horizon_periods".into(),
            reason: "Horizon must be at least 1 period".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scenario_a() -> LoanTerms {
        LoanTerms {
            principal: dec!(6000000),
            rate: dec!(0.06),
            amortization_periods: 30,
            horizon_periods: 10,
        }
    }

    #[test]
    fn test_scenario_a_payment() {
        let sched = scenario_a().schedule().unwrap();
        assert_eq!(sched.len(), 10);
        // 6,000,000 * 0.06 / (1 - 1.06^-30) = 435,893.47
        let payment = sched[0].payment;
        assert!((payment - dec!(435893.47)).abs() < dec!(0.01), "got {payment}");
        assert!(sched.iter().all(|p| p.payment == payment));
    }

    #[test]
    fn test_scenario_a_balance_after_ten_years() {
        let sched = scenario_a().schedule().unwrap();
        let balance = sched[9].ending_balance;
        assert!(balance > Decimal::ZERO && balance < dec!(6000000));
        assert!((balance - dec!(4999663.75)).abs() < dec!(0.01), "got {balance}");
    }

    #[test]
    fn test_full_term_retires_loan() {
        let mut terms = scenario_a();
        terms.horizon_periods = 30;
        let sched = terms.schedule().unwrap();
        assert!(sched[29].ending_balance < dec!(0.000001));
    }

    #[test]
    fn test_balance_recurrence() {
        let terms = scenario_a();
        let sched = terms.schedule().unwrap();
        let mut prev = terms.principal;
        for p in &sched {
            assert_eq!(p.opening_balance, prev);
            assert_eq!(p.interest, prev * terms.rate);
            assert_eq!(p.ending_balance, prev - (p.payment - prev * terms.rate));
            assert!(p.ending_balance <= prev);
            assert!(p.ending_balance >= Decimal::ZERO);
            prev = p.ending_balance;
        }
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let sched = build_schedule(dec!(1000), Decimal::ZERO, 4, 4).unwrap();
        for p in &sched {
            assert_eq!(p.payment, dec!(250));
            assert_eq!(p.interest, Decimal::ZERO);
        }
        assert_eq!(sched[3].ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_horizon_past_term_keeps_level_payment() {
        let sched = build_schedule(dec!(1000), dec!(0.05), 2, 4).unwrap();
        let payment = sched[0].payment;
        assert!(sched.iter().all(|p| p.payment == payment));
        assert!(sched[1].ending_balance < dec!(0.000001));
        for p in &sched[2..] {
            assert_eq!(p.ending_balance, Decimal::ZERO);
            assert!(p.interest.abs() < dec!(0.0000001));
        }
    }

    #[test]
    fn test_long_term_high_rate_does_not_overflow() {
        // 6,000,000 * 1.2^300 is beyond decimal range; the payment is the
        // interest-only perpetuity
        let sched = build_schedule(dec!(6000000), dec!(0.2), 300, 10).unwrap();
        assert_eq!(sched.len(), 10);
        let payment = sched[0].payment;
        assert!((payment - dec!(6000000) * dec!(0.2)).abs() < dec!(0.01), "got {payment}");
        assert!(sched.iter().all(|p| p.ending_balance <= dec!(6000000)));
    }

    #[test]
    fn test_zero_principal() {
        let sched = build_schedule(Decimal::ZERO, dec!(0.06), 30, 10).unwrap();
        assert!(sched.iter().all(|p| p.payment.is_zero() && p.ending_balance.is_zero()));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(build_schedule(dec!(-1), dec!(0.05), 30, 10).is_err());
        assert!(build_schedule(dec!(1000), dec!(-0.01), 30, 10).is_err());
        assert!(build_schedule(dec!(1000), dec!(0.05), 0, 10).is_err());
        assert!(build_schedule(dec!(1000), dec!(0.05), 30, 0).is_err());
    }

    #[test]
    fn test_build_amortization_totals() {
        let terms = LoanTerms {
            principal: dec!(1000),
            rate: dec!(0.05),
            amortization_periods: 5,
            horizon_periods: 5,
        };
        let out = build_amortization(&terms).unwrap().result;
        assert!((out.total_principal - dec!(1000)).abs() < dec!(0.000001));
        assert!(out.balance_at_horizon < dec!(0.000001));
        assert!((out.total_interest - (out.payment * dec!(5) - dec!(1000))).abs() < dec!(0.000001));
    }

    #[test]
    fn test_build_amortization_warns_past_term() {
        let terms = LoanTerms {
            principal: dec!(1000),
            rate: dec!(0.05),
            amortization_periods: 5,
            horizon_periods: 7,
        };
        let out = build_amortization(&terms).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }
}
