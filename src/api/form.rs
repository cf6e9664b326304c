use serde::Deserialize;

use crate::core::{Field, PlanningInputs};

/// A form value as it arrives from the browser: either a JSON number or raw text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn to_number(&self) -> f64 {
        match self {
            RawValue::Number(value) if value.is_finite() => *value,
            RawValue::Number(_) => 0.0,
            RawValue::Text(text) => parse_or_default(text, 0.0),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// Reads the longest leading decimal number in `raw`, ignoring surrounding
/// whitespace. Text with no numeric prefix, or a non-finite or zero
/// result, yields `default`.
///
/// Garbage input silently becomes `default`, which for a default of `0`
/// then passes or fails validation as a zero would. A prefix that overflows
/// to infinity (`"1e999"`) also becomes `default` rather than `inf`.
pub fn parse_or_default(raw: &str, default: f64) -> f64 {
    let text = raw.trim_start();
    let prefix_len = numeric_prefix_len(text);
    match text[..prefix_len].parse::<f64>() {
        Ok(value) if value.is_finite() && value != 0.0 => value,
        _ => default,
    }
}

// Length of the longest prefix shaped like `[+-]digits[.digits][e[+-]digits]`.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    end
}

/// Stores a coerced number into the named field. Ages keep whole years.
pub fn assign(inputs: &mut PlanningInputs, field: Field, value: f64) {
    match field {
        Field::CurrentAge => inputs.current_age = value.trunc() as i32,
        Field::RetirementAge => inputs.retirement_age = value.trunc() as i32,
        Field::CurrentSavings => inputs.current_savings = value,
        Field::MonthlyContribution => inputs.monthly_contribution = value,
        Field::ExpectedReturn => inputs.expected_return = value,
        Field::InflationRate => inputs.inflation_rate = value,
        Field::RetirementExpenses => inputs.retirement_expenses = value,
        Field::SocialSecurity => inputs.social_security = value,
        Field::SafeWithdrawalRate => inputs.safe_withdrawal_rate = value,
    }
}
