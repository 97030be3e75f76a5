//! Crate error type.
//!
//! Only caller mistakes are errors. Infeasible visits, exhausted search
//! budgets, and rebalances that find nothing to move are regular outcomes
//! reported inside the result records.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by the planning engine.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// Input records failed validation. Every detected problem is listed.
    #[error("input validation failed with {} error(s): {}", .0.len(), summarize(.0))]
    Validation(Vec<ValidationError>),
    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Configuration text could not be parsed.
    #[error("failed to parse configuration")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PlanningError>;

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_validation_error_display_lists_all() {
        let err = PlanningError::Validation(vec![
            ValidationError::new(ValidationErrorKind::UnknownDock, "visit 'V1' names dock 'Z'"),
            ValidationError::new(ValidationErrorKind::InvalidTimeWindow, "visit 'V2' ETA after ETD"),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("input validation failed with 2 error(s)"));
        assert!(text.contains("dock 'Z'"));
        assert!(text.contains("ETA after ETD"));
    }

    #[test]
    fn test_config_parse_from_serde() {
        let parse = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: PlanningError = parse.into();
        assert!(matches!(err, PlanningError::ConfigParse(_)));
    }
}
