mod engine;
mod types;
mod validate;

pub use engine::{evaluate, project};
pub use types::{AnnualSpending, FinancialSnapshot, PlanningInputs, ProjectionResult, ProjectionYear};
pub use validate::{Field, ValidationErrors, ValidationResult, validate};
