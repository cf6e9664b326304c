use super::types::{PlanningInputs, ProjectionResult, ProjectionYear};
use super::validate::{ValidationErrors, validate};

#[derive(Debug, Clone, Copy)]
struct GrowthRates {
    annual_return: f64,
    monthly_return: f64,
    annual_inflation: f64,
    withdrawal: f64,
}

impl GrowthRates {
    fn from_inputs(inputs: &PlanningInputs) -> Self {
        let annual_return = inputs.expected_return / 100.0;
        Self {
            annual_return,
            monthly_return: annual_return / 12.0,
            annual_inflation: inputs.inflation_rate / 100.0,
            withdrawal: inputs.safe_withdrawal_rate / 100.0,
        }
    }
}

/// Unrounded headline figures. Rounding happens once, in `project`.
#[derive(Debug, Clone, Copy)]
struct Headline {
    total_savings: f64,
    required_savings: f64,
    inflated_expenses: f64,
    monthly_income: f64,
    total_contributions: f64,
    total_returns: f64,
}

/// Validates first and only projects inputs that pass.
pub fn evaluate(inputs: &PlanningInputs) -> Result<ProjectionResult, ValidationErrors> {
    validate(inputs)?;
    Ok(project(inputs))
}

/// Projects validated inputs. Output for inputs rejected by `validate` is
/// well-formed but meaningless.
pub fn project(inputs: &PlanningInputs) -> ProjectionResult {
    let years = inputs.retirement_age.saturating_sub(inputs.current_age);
    let rates = GrowthRates::from_inputs(inputs);
    let headline = headline_figures(inputs, years, rates);

    let total_retirement_savings = round_money(headline.total_savings);
    let required_savings = round_money(headline.required_savings);
    let surplus = total_retirement_savings - required_savings;

    tracing::debug!(
        years_to_retirement = years,
        total_retirement_savings,
        required_savings,
        surplus,
        "projected retirement plan"
    );

    ProjectionResult {
        years_to_retirement: years,
        total_retirement_savings,
        required_savings,
        surplus,
        is_on_track: surplus >= 0.0,
        monthly_income_at_retirement: round_money(headline.monthly_income),
        inflation_adjusted_expenses: round_money(headline.inflated_expenses),
        total_contributions: round_money(headline.total_contributions),
        total_returns: round_money(headline.total_returns),
        projection_data: yearly_projection(inputs, years, rates),
    }
}

fn headline_figures(inputs: &PlanningInputs, years: i32, rates: GrowthRates) -> Headline {
    let months = f64::from(years) * 12.0;

    let fv_savings = compound(inputs.current_savings, rates.annual_return, years);
    let fv_contributions =
        annuity_future_value(inputs.monthly_contribution, rates.monthly_return, months);
    let total_savings = fv_savings + fv_contributions;

    let inflated_expenses = compound(inputs.retirement_expenses, rates.annual_inflation, years);
    let inflated_social_security = compound(inputs.social_security, rates.annual_inflation, years);
    let net_monthly_need = inflated_expenses - inflated_social_security;
    let required_savings = net_monthly_need * 12.0 / rates.withdrawal;

    let total_contributions = inputs.monthly_contribution * 12.0 * f64::from(years);

    Headline {
        total_savings,
        required_savings,
        inflated_expenses,
        monthly_income: total_savings * rates.withdrawal / 12.0,
        total_contributions,
        total_returns: total_savings - inputs.current_savings - total_contributions,
    }
}

// Annual compounding, distinct from the monthly annuity used for the headline total.
fn yearly_projection(
    inputs: &PlanningInputs,
    years: i32,
    rates: GrowthRates,
) -> Vec<ProjectionYear> {
    let yearly_contribution = inputs.monthly_contribution * 12.0;
    let mut balance = inputs.current_savings;
    let mut rows = Vec::new();

    for year in 0..=years {
        if year > 0 {
            balance += balance * rates.annual_return + yearly_contribution;
        }
        let contributions = yearly_contribution * f64::from(year);
        rows.push(ProjectionYear {
            age: inputs.current_age.saturating_add(year),
            year,
            balance: round_money(balance),
            contributions: round_money(contributions),
            returns: round_money(balance - inputs.current_savings - contributions),
        });
    }
    rows
}

fn compound(amount: f64, rate: f64, years: i32) -> f64 {
    amount * (1.0 + rate).powf(f64::from(years))
}

/// Future value of an ordinary annuity of `payment` per period.
fn annuity_future_value(payment: f64, periodic_rate: f64, periods: f64) -> f64 {
    if periodic_rate == 0.0 {
        return payment * periods;
    }
    payment * ((1.0 + periodic_rate).powf(periods) - 1.0) / periodic_rate
}

/// Nearest whole unit, halves rounded up.
pub(crate) fn round_money(value: f64) -> f64 {
    (value + 0.5).floor()
}
