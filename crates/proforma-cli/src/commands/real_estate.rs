use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::real_estate::amortization::{self, LoanTerms};
use proforma_core::real_estate::cash_flow::{self, ProjectionInput};
use proforma_core::real_estate::pro_forma::{self, ProFormaInput};
use proforma_core::real_estate::returns::{self, ReturnsInput};

use crate::input;

/// Arguments for the full pro-forma model
#[derive(Args)]
pub struct ModelArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Acquisition price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Year-1 net operating income
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Annual NOI growth as a decimal (0.02 = 2%)
    #[arg(long, allow_hyphen_values = true)]
    pub revenue_growth: Option<Decimal>,

    /// Exit cap rate as a decimal
    #[arg(long)]
    pub exit_cap: Option<Decimal>,

    /// Loan-to-value as a decimal
    #[arg(long)]
    pub ltv: Option<Decimal>,

    /// Annual loan interest rate as a decimal
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Amortisation term in years
    #[arg(long)]
    pub amortization_years: Option<u32>,

    /// Holding period in years
    #[arg(long, default_value_t = 10)]
    pub hold_years: u32,
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model_input: ProFormaInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ProFormaInput {
            purchase_price: args
                .purchase_price
                .ok_or("--purchase-price is required (or provide --input)")?,
            noi_year_1: args.noi.ok_or("--noi is required (or provide --input)")?,
            revenue_growth: args
                .revenue_growth
                .ok_or("--revenue-growth is required (or provide --input)")?,
            exit_cap_rate: args
                .exit_cap
                .ok_or("--exit-cap is required (or provide --input)")?,
            ltv: args.ltv.ok_or("--ltv is required (or provide --input)")?,
            interest_rate: args
                .interest_rate
                .ok_or("--interest-rate is required (or provide --input)")?,
            amortization_years: args
                .amortization_years
                .ok_or("--amortization-years is required (or provide --input)")?,
            hold_period_years: args.hold_years,
        }
    };

    let result = pro_forma::run_pro_forma(&model_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a loan amortisation schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Interest rate per period as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of periods to fully amortise the loan
    #[arg(long)]
    pub amortization_periods: Option<u32>,

    /// Number of periods to report (defaults to the amortisation term)
    #[arg(long)]
    pub horizon_periods: Option<u32>,
}

fn loan_terms_from_flags(
    principal: Option<Decimal>,
    rate: Option<Decimal>,
    amortization_periods: Option<u32>,
    horizon_periods: Option<u32>,
) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    let amortization_periods =
        amortization_periods.ok_or("--amortization-periods is required (or provide --input)")?;
    Ok(LoanTerms {
        principal: principal.ok_or("--principal is required (or provide --input)")?,
        rate: rate.ok_or("--rate is required (or provide --input)")?,
        amortization_periods,
        horizon_periods: horizon_periods.unwrap_or(amortization_periods),
    })
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        loan_terms_from_flags(
            args.principal,
            args.rate,
            args.amortization_periods,
            args.horizon_periods,
        )?
    };

    let result = amortization::build_amortization(&terms)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for an NOI / debt-service projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON or YAML input file with `noi_year_1`, `growth_rate` and `schedule`
    #[arg(long)]
    pub input: Option<String>,

    /// Year-1 net operating income
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Annual NOI growth as a decimal
    #[arg(long, allow_hyphen_values = true)]
    pub growth: Option<Decimal>,

    /// Loan principal (the schedule is built from the loan flags)
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Interest rate per period as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of periods to fully amortise the loan
    #[arg(long)]
    pub amortization_periods: Option<u32>,

    /// Number of years to project
    #[arg(long)]
    pub horizon_periods: Option<u32>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let terms = loan_terms_from_flags(
            args.principal,
            args.rate,
            args.amortization_periods,
            args.horizon_periods,
        )?;
        ProjectionInput {
            noi_year_1: args.noi.ok_or("--noi is required (or provide --input)")?,
            growth_rate: args.growth.ok_or("--growth is required (or provide --input)")?,
            schedule: terms.schedule()?,
        }
    };

    let result = cash_flow::project_cash_flows(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for exit and return metrics
#[derive(Args)]
pub struct ReturnsArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Equity invested at t = 0
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Free cash flow to equity per year (comma-separated, e.g. "200000,210000,-5000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// NOI of the final holding year
    #[arg(long)]
    pub final_noi: Option<Decimal>,

    /// Exit cap rate as a decimal
    #[arg(long)]
    pub exit_cap: Option<Decimal>,

    /// Loan balance repaid at sale
    #[arg(long, default_value = "0")]
    pub remaining_balance: Decimal,
}

pub fn run_returns(args: ReturnsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let returns_input: ReturnsInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ReturnsInput {
            equity: args.equity.ok_or("--equity is required (or provide --input)")?,
            free_cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            final_noi: args
                .final_noi
                .ok_or("--final-noi is required (or provide --input)")?,
            exit_cap_rate: args
                .exit_cap
                .ok_or("--exit-cap is required (or provide --input)")?,
            remaining_balance: args.remaining_balance,
        }
    };

    let result = returns::calculate_returns(&returns_input)?;
    Ok(serde_json::to_value(result)?)
}
