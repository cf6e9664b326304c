use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::types::PlanningInputs;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    CurrentAge,
    RetirementAge,
    CurrentSavings,
    MonthlyContribution,
    ExpectedReturn,
    InflationRate,
    RetirementExpenses,
    SocialSecurity,
    SafeWithdrawalRate,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::CurrentAge,
        Field::RetirementAge,
        Field::CurrentSavings,
        Field::MonthlyContribution,
        Field::ExpectedReturn,
        Field::InflationRate,
        Field::RetirementExpenses,
        Field::SocialSecurity,
        Field::SafeWithdrawalRate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::CurrentAge => "currentAge",
            Field::RetirementAge => "retirementAge",
            Field::CurrentSavings => "currentSavings",
            Field::MonthlyContribution => "monthlyContribution",
            Field::ExpectedReturn => "expectedReturn",
            Field::InflationRate => "inflationRate",
            Field::RetirementExpenses => "retirementExpenses",
            Field::SocialSecurity => "socialSecurity",
            Field::SafeWithdrawalRate => "safeWithdrawalRate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every field that failed validation, with a message fit for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    pub(crate) fn insert(&mut self, field: Field, message: &str) {
        self.errors.insert(field, message.to_string());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "invalid planning inputs: {summary}")
    }
}

impl std::error::Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.errors.serialize(serializer)
    }
}

pub type ValidationResult = Result<(), ValidationErrors>;

pub fn validate(inputs: &PlanningInputs) -> ValidationResult {
    let mut errors = ValidationErrors::default();

    if !(18..=80).contains(&inputs.current_age) {
        errors.insert(Field::CurrentAge, "Age must be between 18 and 80");
    }

    if inputs.retirement_age <= inputs.current_age {
        errors.insert(
            Field::RetirementAge,
            "Retirement age must be greater than current age",
        );
    }

    if !inputs.current_savings.is_finite() || inputs.current_savings < 0.0 {
        errors.insert(Field::CurrentSavings, "Current savings cannot be negative");
    }

    if !inputs.monthly_contribution.is_finite() || inputs.monthly_contribution < 0.0 {
        errors.insert(
            Field::MonthlyContribution,
            "Monthly contribution cannot be negative",
        );
    }

    if !(0.0..=20.0).contains(&inputs.expected_return) {
        errors.insert(
            Field::ExpectedReturn,
            "Expected return should be between 0% and 20%",
        );
    }

    if !(0.0..=10.0).contains(&inputs.inflation_rate) {
        errors.insert(
            Field::InflationRate,
            "Inflation rate should be between 0% and 10%",
        );
    }

    if !(1.0..=10.0).contains(&inputs.safe_withdrawal_rate) {
        errors.insert(
            Field::SafeWithdrawalRate,
            "Safe withdrawal rate should be between 1% and 10%",
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
