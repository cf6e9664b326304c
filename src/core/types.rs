use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningInputs {
    pub current_age: i32,
    pub retirement_age: i32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    /// Annual nominal growth rate in percent.
    pub expected_return: f64,
    /// Annual inflation in percent, applied to expenses and social security.
    pub inflation_rate: f64,
    /// Monthly spending need in retirement, today's money.
    pub retirement_expenses: f64,
    /// Monthly guaranteed income in retirement, today's money.
    pub social_security: f64,
    /// Annual percent of the nest egg assumed safely spendable.
    pub safe_withdrawal_rate: f64,
}

impl Default for PlanningInputs {
    fn default() -> Self {
        Self {
            current_age: 50,
            retirement_age: 62,
            current_savings: 1_000_000.0,
            monthly_contribution: 3_000.0,
            expected_return: 6.0,
            inflation_rate: 3.0,
            retirement_expenses: 10_000.0,
            social_security: 4_000.0,
            safe_withdrawal_rate: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionYear {
    pub age: i32,
    pub year: i32,
    pub balance: f64,
    pub contributions: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub years_to_retirement: i32,
    pub total_retirement_savings: f64,
    pub required_savings: f64,
    pub surplus: f64,
    pub is_on_track: bool,
    pub monthly_income_at_retirement: f64,
    pub inflation_adjusted_expenses: f64,
    pub total_contributions: f64,
    pub total_returns: f64,
    pub projection_data: Vec<ProjectionYear>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualSpending {
    pub year: i32,
    pub amount: f64,
}

/// Actual figures supplied by the user. When present they replace the
/// modelled savings and retirement expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub net_worth: f64,
    /// Net worth change over the last six months.
    pub net_worth_growth: f64,
    pub annual_spending: Vec<AnnualSpending>,
}

impl Default for FinancialSnapshot {
    fn default() -> Self {
        Self {
            net_worth: 1_000_000.0,
            net_worth_growth: 6_000.0,
            annual_spending: vec![
                AnnualSpending {
                    year: 2024,
                    amount: 89_000.30,
                },
                AnnualSpending {
                    year: 2023,
                    amount: 12_990.88,
                },
            ],
        }
    }
}

impl FinancialSnapshot {
    /// Average monthly spending across the recorded years, rounded to whole units.
    pub fn average_monthly_spending(&self) -> Option<f64> {
        if self.annual_spending.is_empty() {
            return None;
        }
        let total: f64 = self.annual_spending.iter().map(|s| s.amount).sum();
        let years = self.annual_spending.len() as f64;
        Some(super::engine::round_money(total / years / 12.0))
    }

    pub fn apply(&self, inputs: &PlanningInputs) -> PlanningInputs {
        let mut enhanced = inputs.clone();
        enhanced.current_savings = self.net_worth;
        if let Some(monthly) = self.average_monthly_spending() {
            enhanced.retirement_expenses = monthly;
        }
        enhanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_overrides_savings_and_expenses() {
        let snapshot = FinancialSnapshot::default();
        let enhanced = snapshot.apply(&PlanningInputs::default());

        assert_eq!(enhanced.current_savings, 1_000_000.0);
        // (89_000.30 + 12_990.88) / 2 / 12 = 4_249.63
        assert_eq!(enhanced.retirement_expenses, 4_250.0);
        assert_eq!(enhanced.current_age, 50);
        assert_eq!(enhanced.social_security, 4_000.0);
    }

    #[test]
    fn snapshot_without_spending_keeps_expenses() {
        let snapshot = FinancialSnapshot {
            net_worth: 250_000.0,
            net_worth_growth: 0.0,
            annual_spending: Vec::new(),
        };
        let inputs = PlanningInputs::default();
        let enhanced = snapshot.apply(&inputs);

        assert_eq!(enhanced.current_savings, 250_000.0);
        assert_eq!(enhanced.retirement_expenses, inputs.retirement_expenses);
        assert_eq!(snapshot.average_monthly_spending(), None);
    }

    #[test]
    fn inputs_deserialize_from_camel_case() {
        let json = r#"{
          "currentAge": 40,
          "retirementAge": 65,
          "currentSavings": 50000,
          "monthlyContribution": 500,
          "expectedReturn": 7,
          "inflationRate": 2.5,
          "retirementExpenses": 4000,
          "socialSecurity": 1500,
          "safeWithdrawalRate": 4
        }"#;
        let inputs: PlanningInputs = serde_json::from_str(json).expect("valid json");
        assert_eq!(inputs.current_age, 40);
        assert_eq!(inputs.retirement_age, 65);
        assert_eq!(inputs.inflation_rate, 2.5);
    }
}
