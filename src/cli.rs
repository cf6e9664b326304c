use std::net::{IpAddr, SocketAddr};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::api::evaluate_for_display;
use crate::config::AdvisorConfig;
use crate::core::{AnnualSpending, FinancialSnapshot, PlanningInputs, ProjectionResult, ValidationErrors};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement savings projection with optional AI commentary"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the planner page and JSON API
    Serve(ServeArgs),
    /// Evaluate one scenario and print the projection as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "NESTEGG_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "NESTEGG_PORT", default_value_t = 8080)]
    pub port: u16,
    #[command(flatten)]
    pub advisor: AdvisorConfig,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 50, allow_negative_numbers = true)]
    pub current_age: i32,
    #[arg(long, default_value_t = 62, allow_negative_numbers = true)]
    pub retirement_age: i32,
    #[arg(long, default_value_t = 1_000_000.0, allow_negative_numbers = true)]
    pub current_savings: f64,
    #[arg(long, default_value_t = 3_000.0, allow_negative_numbers = true)]
    pub monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent"
    )]
    pub expected_return: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        allow_negative_numbers = true,
        help = "Annual inflation in percent"
    )]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 10_000.0,
        allow_negative_numbers = true,
        help = "Monthly spending in retirement, today's money"
    )]
    pub retirement_expenses: f64,
    #[arg(
        long,
        default_value_t = 4_000.0,
        allow_negative_numbers = true,
        help = "Monthly social security income, today's money"
    )]
    pub social_security: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        allow_negative_numbers = true,
        help = "Safe withdrawal rate in percent"
    )]
    pub safe_withdrawal_rate: f64,
    #[arg(long, help = "Actual net worth; replaces --current-savings")]
    pub net_worth: Option<f64>,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Net worth change over the last six months"
    )]
    pub net_worth_growth: f64,
    #[arg(
        long = "spending",
        value_parser = parse_spending,
        requires = "net_worth",
        help = "Actual annual spending as YEAR=AMOUNT; repeatable, replaces --retirement-expenses"
    )]
    pub spending: Vec<AnnualSpending>,
    #[arg(long)]
    pub pretty: bool,
}

impl ProjectArgs {
    pub fn inputs(&self) -> PlanningInputs {
        PlanningInputs {
            current_age: self.current_age,
            retirement_age: self.retirement_age,
            current_savings: self.current_savings,
            monthly_contribution: self.monthly_contribution,
            expected_return: self.expected_return,
            inflation_rate: self.inflation_rate,
            retirement_expenses: self.retirement_expenses,
            social_security: self.social_security,
            safe_withdrawal_rate: self.safe_withdrawal_rate,
        }
    }

    pub fn snapshot(&self) -> Option<FinancialSnapshot> {
        self.net_worth.map(|net_worth| FinancialSnapshot {
            net_worth,
            net_worth_growth: self.net_worth_growth,
            annual_spending: self.spending.clone(),
        })
    }
}

fn parse_spending(raw: &str) -> Result<AnnualSpending, String> {
    let (year, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected YEAR=AMOUNT, got {raw:?}"))?;
    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid year {year:?}: {e}"))?;
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount {amount:?}: {e}"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("spending for {year} must be >= 0"));
    }
    Ok(AnnualSpending { year, amount })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOutput {
    pub inputs: PlanningInputs,
    pub result: ProjectionResult,
}

pub fn run_project(args: &ProjectArgs) -> Result<ProjectOutput, ValidationErrors> {
    let inputs = match args.snapshot() {
        Some(snapshot) => snapshot.apply(&args.inputs()),
        None => args.inputs(),
    };
    let result = evaluate_for_display(&inputs)?;
    Ok(ProjectOutput { inputs, result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Field;

    fn project_args(extra: &[&str]) -> ProjectArgs {
        let mut argv = vec!["nestegg", "project"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).expect("arguments should parse").command {
            Command::Project(args) => args,
            other => panic!("expected project command, got {other:?}"),
        }
    }

    #[test]
    fn project_defaults_match_reference_scenario() {
        let args = project_args(&[]);
        assert_eq!(args.inputs(), PlanningInputs::default());
        assert!(args.snapshot().is_none());

        let output = run_project(&args).expect("defaults are valid");
        assert_eq!(output.result.years_to_retirement, 12);
        assert_eq!(output.result.total_retirement_savings, 2_642_647.0);
    }

    #[test]
    fn project_reports_validation_errors() {
        let args = project_args(&["--current-age", "85", "--retirement-age", "70"]);
        let errors = run_project(&args).expect_err("age 85 is invalid");
        assert!(errors.contains(Field::CurrentAge));
        assert!(errors.contains(Field::RetirementAge));
    }

    #[test]
    fn negative_values_reach_the_validator() {
        let args = project_args(&["--current-savings", "-5"]);
        let errors = run_project(&args).expect_err("negative savings is invalid");
        assert_eq!(
            errors.get(Field::CurrentSavings),
            Some("Current savings cannot be negative")
        );
    }

    #[test]
    fn huge_retirement_age_is_refused() {
        let args = project_args(&["--retirement-age", "200000000"]);
        let errors = run_project(&args).expect_err("horizon past the cap");
        assert!(errors.contains(Field::RetirementAge));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn spending_flags_build_snapshot() {
        let args = project_args(&[
            "--net-worth",
            "800000",
            "--spending",
            "2024=60000",
            "--spending",
            "2023=48000",
        ]);
        let output = run_project(&args).expect("snapshot inputs are valid");
        assert_eq!(output.inputs.current_savings, 800_000.0);
        assert_eq!(output.inputs.retirement_expenses, 4_500.0);
    }

    #[test]
    fn spending_requires_net_worth() {
        let err = Cli::try_parse_from(["nestegg", "project", "--spending", "2024=1000"])
            .expect_err("--spending without --net-worth is rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parse_spending_rejects_bad_pairs() {
        assert!(parse_spending("2024").is_err());
        assert!(parse_spending("year=10").is_err());
        assert!(parse_spending("2024=-1").is_err());
        assert_eq!(
            parse_spending(" 2024 = 1200.5 "),
            Ok(AnnualSpending {
                year: 2024,
                amount: 1_200.5
            })
        );
    }

    #[test]
    fn serve_reads_port_and_advisor() {
        let cli = Cli::try_parse_from(["nestegg", "serve", "--port", "9000", "--advisor", "stub"])
            .expect("arguments should parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.addr().port(), 9000);
        assert_eq!(args.advisor.kind, crate::config::AdvisorKind::Stub);
    }
}
