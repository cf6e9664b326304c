use crate::core::{FinancialSnapshot, PlanningInputs, ProjectionResult};

const PREAMBLE: &str = "You are a financial advisor AI analyzing retirement planning data. \
Based on the following information, provide personalized insights and recommendations:";

const INSTRUCTIONS: [&str; 5] = [
    "Analysis of current financial trajectory",
    "Specific recommendations for retirement planning",
    "Assessment of spending patterns and their impact",
    "Actionable steps to optimize retirement readiness",
    "Risk factors and opportunities",
];

const LENGTH_LIMIT: &str = "Keep response concise but insightful (max 500 words).";

/// Text digest of a plan, sent to an advice provider as a single user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvicePrompt {
    text: String,
}

impl AdvicePrompt {
    pub fn render(
        inputs: &PlanningInputs,
        snapshot: Option<&FinancialSnapshot>,
        result: &ProjectionResult,
    ) -> Self {
        let mut lines = vec![PREAMBLE.to_string(), String::new()];

        lines.push("CURRENT FINANCIAL SITUATION:".to_string());
        match snapshot {
            Some(snapshot) => {
                lines.push(format!("- Net Worth: {}", format_money(snapshot.net_worth)));
                lines.push(format!(
                    "- Net Worth Growth (6 months): {}",
                    format_signed_money(snapshot.net_worth_growth)
                ));
                for spending in &snapshot.annual_spending {
                    lines.push(format!(
                        "- {} Spending: {}",
                        spending.year,
                        format_money(spending.amount)
                    ));
                }
            }
            None => lines.push(format!(
                "- Net Worth: {}",
                format_money(inputs.current_savings)
            )),
        }
        lines.push(String::new());

        lines.push("RETIREMENT PLANNING INPUTS:".to_string());
        lines.push(format!("- Current Age: {}", inputs.current_age));
        lines.push(format!("- Retirement Age: {}", inputs.retirement_age));
        lines.push(format!("- Current Savings: {}", format_money(inputs.current_savings)));
        lines.push(format!(
            "- Monthly Contribution: {}",
            format_money(inputs.monthly_contribution)
        ));
        lines.push(format!("- Expected Return: {}%", inputs.expected_return));
        lines.push(format!(
            "- Expected Monthly Retirement Expenses: {}",
            format_money(inputs.retirement_expenses)
        ));
        lines.push(String::new());

        lines.push("PROJECTION:".to_string());
        lines.push(format!(
            "- Projected Savings at Retirement: {}",
            format_money(result.total_retirement_savings)
        ));
        lines.push(format!(
            "- Required Savings: {}",
            format_money(result.required_savings)
        ));
        let gap_label = if result.is_on_track { "Surplus" } else { "Shortfall" };
        lines.push(format!(
            "- {gap_label}: {}",
            format_money(result.surplus.abs())
        ));
        lines.push(format!(
            "- Monthly Income at Retirement: {}",
            format_money(result.monthly_income_at_retirement)
        ));
        lines.push(String::new());

        lines.push("Please provide:".to_string());
        for (index, item) in INSTRUCTIONS.iter().enumerate() {
            lines.push(format!("{}. {item}", index + 1));
        }
        lines.push(String::new());
        lines.push(LENGTH_LIMIT.to_string());

        Self {
            text: lines.join("\n"),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Dollar amount with thousands separators; cents only when non-zero.
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{fraction:02}")
    }
}

fn format_signed_money(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+{}", format_money(amount))
    } else {
        format_money(amount)
    }
}
