use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProFormaError;
use crate::types::{Money, Rate};
use crate::ProFormaResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const RATE_TOLERANCE: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const IRR_GUESS: Rate = dec!(0.10);
const IRR_LOWER_BOUND: Rate = dec!(-0.99);
const IRR_UPPER_BOUND: Rate = dec!(10.0);

/// Why an IRR could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrrFailure {
    /// Fewer than two cash flows
    InsufficientFlows,
    /// Every flow has the same sign (or is zero), so NPV never crosses zero
    NoSignChange,
    /// Neither Newton-Raphson nor bisection located a root
    NonConvergence { iterations: u32, residual: Money },
}

impl fmt::Display for IrrFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrrFailure::InsufficientFlows => write!(f, "IRR requires at least 2 cash flows"),
            IrrFailure::NoSignChange => {
                write!(f, "cash flows never change sign, no rate sets NPV to zero")
            }
            IrrFailure::NonConvergence {
                iterations,
                residual,
            } => write!(
                f,
                "root-finder did not converge after {iterations} iterations (residual NPV: {residual})"
            ),
        }
    }
}

/// Result of the bounded IRR root-finder. An undefined IRR is a valid
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    Converged { rate: Rate, iterations: u32 },
    Undefined { reason: IrrFailure },
}

impl IrrOutcome {
    /// The periodic rate, if one was found.
    pub fn rate(&self) -> Option<Rate> {
        match self {
            IrrOutcome::Converged { rate, .. } => Some(*rate),
            IrrOutcome::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }
}

/// (1 + rate)^periods by repeated multiplication. `None` on overflow.
pub fn compound(rate: Rate, periods: u32) -> Option<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    (0..periods).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(one_plus_r))
}

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProFormaResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProFormaError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    checked_npv(rate, cash_flows).ok_or_else(|| ProFormaError::UndefinedResult {
        metric: "NPV".into(),
        reason: format!("discounting at {rate} overflows decimal precision"),
    })
}

/// Payment (PMT), spreadsheet sign convention: a positive present value
/// yields a negative payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> ProFormaResult<Money> {
    if nper == 0 {
        return Err(ProFormaError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = compound(rate, nper);
    if let Some(f) = factor {
        if f == Decimal::ONE {
            return Err(ProFormaError::UndefinedResult {
                metric: "PMT".into(),
                reason: "annuity factor is zero".into(),
            });
        }
    }

    let level = factor.and_then(|f| {
        let annuity_factor = (f - Decimal::ONE).checked_div(rate)?;
        present_value
            .checked_mul(f)?
            .checked_add(future_value)?
            .checked_div(annuity_factor)
    });

    match level {
        Some(payment) => Ok(-payment),
        // (1+r)^n or pv(1+r)^n beyond decimal range: the annuity collapses
        // to a perpetuity
        None => present_value
            .checked_mul(rate)
            .map(|p| -p)
            .ok_or_else(|| ProFormaError::UndefinedResult {
                metric: "PMT".into(),
                reason: format!("payment on {present_value} at {rate} overflows decimal precision"),
            }),
    }
}

/// Internal Rate of Return over evenly spaced periods.
///
/// Newton-Raphson from a 10% guess, falling back to bisection over
/// [-99%, 1000%]. Never fails: a missing root is reported as
/// [`IrrOutcome::Undefined`].
pub fn irr(cash_flows: &[Money]) -> IrrOutcome {
    if cash_flows.len() < 2 {
        return IrrOutcome::Undefined {
            reason: IrrFailure::InsufficientFlows,
        };
    }

    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_positive || !has_negative {
        return IrrOutcome::Undefined {
            reason: IrrFailure::NoSignChange,
        };
    }

    let mut rate = IRR_GUESS;

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate) else {
            break;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return IrrOutcome::Converged {
                rate,
                iterations: i,
            };
        }

        let Some(step) = npv_val.checked_div(dnpv) else {
            break;
        };
        rate -= step;

        // Guard against divergence
        if rate < IRR_LOWER_BOUND {
            rate = IRR_LOWER_BOUND;
        } else if rate > IRR_UPPER_BOUND {
            rate = IRR_UPPER_BOUND;
        }
    }

    log::debug!("IRR: Newton-Raphson stalled at {rate}, falling back to bisection");
    bisect_irr(cash_flows)
}

fn bisect_irr(cash_flows: &[Money]) -> IrrOutcome {
    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;

    let sign_low = npv_sign(cash_flows, low);
    let sign_high = npv_sign(cash_flows, high);

    if sign_low == sign_high {
        return IrrOutcome::Undefined {
            reason: IrrFailure::NonConvergence {
                iterations: MAX_IRR_ITERATIONS,
                residual: checked_npv(high, cash_flows).unwrap_or(Decimal::MAX),
            },
        };
    }

    let mut mid = (low + high) / dec!(2);
    for i in 0..MAX_BISECTION_ITERATIONS {
        mid = (low + high) / dec!(2);
        let value = checked_npv(mid, cash_flows);

        let converged = value.is_some_and(|v| v.abs() < CONVERGENCE_THRESHOLD)
            || high - low < RATE_TOLERANCE;
        if converged {
            return IrrOutcome::Converged {
                rate: mid,
                iterations: MAX_IRR_ITERATIONS + i + 1,
            };
        }

        let sign_mid = value
            .map(|v| v.signum())
            .unwrap_or_else(|| dominant_sign_near_minus_one(cash_flows));
        if sign_mid == sign_low {
            low = mid;
        } else {
            high = mid;
        }
    }

    IrrOutcome::Undefined {
        reason: IrrFailure::NonConvergence {
            iterations: MAX_IRR_ITERATIONS + MAX_BISECTION_ITERATIONS,
            residual: checked_npv(mid, cash_flows).unwrap_or(Decimal::MAX),
        },
    }
}

/// NPV with overflow-checked arithmetic. A discount factor that leaves the
/// decimal range makes every later term negligible, so the sum stops there;
/// a term that itself overflows yields `None`.
fn checked_npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                None => break,
            }
        }
        result = result.checked_add(cf.checked_div(discount)?)?;
    }

    Some(result)
}

fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
            let t_dec = Decimal::from(t as u64);
            let next = discount.checked_mul(one_plus_r)?;
            dnpv = dnpv.checked_sub(t_dec.checked_mul(*cf)?.checked_div(next)?)?;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
    }

    Some((npv_val, dnpv))
}

fn npv_sign(cash_flows: &[Money], rate: Rate) -> Decimal {
    checked_npv(rate, cash_flows)
        .map(|v| v.signum())
        .unwrap_or_else(|| dominant_sign_near_minus_one(cash_flows))
}

/// As the rate approaches -100% the latest non-zero flow dominates NPV.
fn dominant_sign_near_minus_one(cash_flows: &[Money]) -> Decimal {
    cash_flows
        .iter()
        .rev()
        .find(|cf| !cf.is_zero())
        .map(|cf| cf.signum())
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        assert!(npv(dec!(-1), &[dec!(-100), dec!(110)]).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let rate = irr(&cfs).rate().unwrap();
        // IRR should be ~9.7%
        assert!((rate - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_zero_when_flows_return_principal() {
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(100)).take(10));
        let rate = irr(&cfs).rate().unwrap();
        assert!(rate.abs() < dec!(0.000001), "got {rate}");
    }

    #[test]
    fn test_irr_no_sign_change() {
        let outcome = irr(&[dec!(100), dec!(50), dec!(50)]);
        assert_eq!(
            outcome,
            IrrOutcome::Undefined {
                reason: IrrFailure::NoSignChange
            }
        );
        assert!(!outcome.is_defined());
    }

    #[test]
    fn test_irr_all_zero_flows() {
        let outcome = irr(&[Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(outcome.rate(), None);
    }

    #[test]
    fn test_irr_single_flow() {
        assert_eq!(
            irr(&[dec!(-100)]),
            IrrOutcome::Undefined {
                reason: IrrFailure::InsufficientFlows
            }
        );
    }

    #[test]
    fn test_irr_without_real_root_is_non_convergent() {
        // -100 + 300x - 300x^2 with x = 1/(1+r) has no real root
        let outcome = irr(&[dec!(-100), dec!(300), dec!(-300)]);
        match outcome {
            IrrOutcome::Undefined {
                reason: IrrFailure::NonConvergence { .. },
            } => {}
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_irr_deeply_negative_return() {
        // Lose 95% over one period
        let rate = irr(&[dec!(-1000), dec!(50)]).rate().unwrap();
        assert!((rate - dec!(-0.95)).abs() < dec!(0.0001), "got {rate}");
    }

    #[test]
    fn test_bisection_matches_newton() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let newton = irr(&cfs).rate().unwrap();
        let bisected = bisect_irr(&cfs).rate().unwrap();
        assert!((newton - bisected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_pmt_standard_annuity() {
        // 100,000 over 10 periods at 5%: 12,950.46
        let result = pmt(dec!(0.05), 10, dec!(100000), Decimal::ZERO).unwrap();
        assert!((result + dec!(12950.46)).abs() < dec!(0.01), "got {result}");
    }

    #[test]
    fn test_pmt_zero_rate() {
        let result = pmt(Decimal::ZERO, 4, dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(result, dec!(-250));
    }

    #[test]
    fn test_pmt_zero_periods() {
        assert!(pmt(dec!(0.05), 0, dec!(1000), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_pmt_large_factor_falls_back_to_perpetuity() {
        // 1.2^300 fits in a Decimal, 6,000,000 * 1.2^300 does not
        let result = pmt(dec!(0.2), 300, dec!(6000000), Decimal::ZERO).unwrap();
        assert_eq!(result, dec!(-1200000));

        // (1+r)^n itself overflows
        let result = pmt(dec!(1), 200, dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(result, dec!(-1000));
    }

    #[test]
    fn test_pmt_overflowing_perpetuity_is_undefined() {
        assert!(matches!(
            pmt(dec!(10), 100, Decimal::MAX, Decimal::ZERO),
            Err(ProFormaError::UndefinedResult { .. })
        ));
    }

    #[test]
    fn test_compound() {
        assert_eq!(compound(dec!(0.10), 2), Some(dec!(1.2100)));
        assert_eq!(compound(dec!(0.10), 0), Some(Decimal::ONE));
        assert_eq!(compound(dec!(1), 200), None);
    }
}
