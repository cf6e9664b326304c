use crate::advice::{AdviceError, AdvicePrompt};
use crate::core::{
    Field, FinancialSnapshot, PlanningInputs, ProjectionResult, ValidationErrors, ValidationResult,
    project, validate,
};

use super::form::{RawValue, assign};

/// Longest retirement horizon the planner will chart. The yearly series
/// holds one row per year, so longer spans are refused before projecting.
pub const MAX_PROJECTION_YEARS: i32 = 1_000;

/// `validate`, plus the charting horizon cap on the retirement age.
pub fn validate_for_display(inputs: &PlanningInputs) -> ValidationResult {
    validate(inputs)?;
    if inputs.retirement_age - inputs.current_age > MAX_PROJECTION_YEARS {
        let mut errors = ValidationErrors::default();
        errors.insert(
            Field::RetirementAge,
            &format!("Retirement age must be within {MAX_PROJECTION_YEARS} years of current age"),
        );
        return Err(errors);
    }
    Ok(())
}

/// Projects inputs that pass `validate_for_display`.
pub fn evaluate_for_display(inputs: &PlanningInputs) -> Result<ProjectionResult, ValidationErrors> {
    validate_for_display(inputs)?;
    Ok(project(inputs))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AdviceState {
    #[default]
    Idle,
    Loading,
    Ready(String),
    Failed(String),
}

impl AdviceState {
    pub fn text(&self) -> Option<&str> {
        match self {
            AdviceState::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            AdviceState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Everything the page holds between interactions. The calculator core only
/// ever receives copies of the inputs.
#[derive(Debug, Clone, Default)]
pub struct PlannerSession {
    inputs: PlanningInputs,
    snapshot: Option<FinancialSnapshot>,
    errors: Option<ValidationErrors>,
    advice: AdviceState,
}

impl PlannerSession {
    pub fn inputs(&self) -> &PlanningInputs {
        &self.inputs
    }

    pub fn snapshot(&self) -> Option<&FinancialSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    pub fn advice(&self) -> &AdviceState {
        &self.advice
    }

    /// Inputs with the snapshot's actual figures applied.
    pub fn effective_inputs(&self) -> PlanningInputs {
        match &self.snapshot {
            Some(snapshot) => snapshot.apply(&self.inputs),
            None => self.inputs.clone(),
        }
    }

    pub fn set_field(&mut self, field: Field, raw: &RawValue) {
        assign(&mut self.inputs, field, raw.to_number());
        self.revalidate();
    }

    pub fn set_snapshot(&mut self, snapshot: Option<FinancialSnapshot>) {
        self.snapshot = snapshot;
        self.revalidate();
    }

    pub fn evaluate(&self) -> Result<ProjectionResult, ValidationErrors> {
        evaluate_for_display(&self.effective_inputs())
    }

    pub fn advice_prompt(&self) -> Result<(AdvicePrompt, ProjectionResult), ValidationErrors> {
        let inputs = self.effective_inputs();
        let result = evaluate_for_display(&inputs)?;
        let prompt = AdvicePrompt::render(&inputs, self.snapshot.as_ref(), &result);
        Ok((prompt, result))
    }

    pub fn begin_advice(&mut self) {
        self.advice = AdviceState::Loading;
    }

    pub fn finish_advice(&mut self, outcome: Result<String, AdviceError>) {
        self.advice = match outcome {
            Ok(text) => AdviceState::Ready(text),
            Err(err) => AdviceState::Failed(err.user_message()),
        };
    }

    fn revalidate(&mut self) {
        self.errors = validate_for_display(&self.effective_inputs()).err();
    }
}
