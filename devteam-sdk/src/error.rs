//! Error types for roles, completion backends and workflow runs

use thiserror::Error;

/// Result type for devteam operations
pub type Result<T> = std::result::Result<T, DevTeamError>;

/// Errors raised while resolving, executing or accounting workflow steps
#[derive(Debug, Error)]
pub enum DevTeamError {
    /// A step referenced a role id that is not registered
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// Cumulative tracked cost is above the configured ceiling
    #[error("Cost limit exceeded: ${spent:.4} > ${limit}")]
    BudgetExceeded { spent: f64, limit: f64 },

    /// The language-model backend failed (network, rate limit, malformed response)
    #[error("Completion backend failure: {0}")]
    Completion(String),

    /// A purchase was attempted with an unrecognized license key
    #[error("Invalid license key for role '{0}'")]
    LicenseInvalid(String),

    /// Raw completion text could not be interpreted as the expected shape
    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// Two steps of one workflow write the same context key
    #[error("Duplicate output key '{0}' in workflow")]
    DuplicateOutputKey(String),

    #[error("Marketplace role not found: {0}")]
    MarketplaceRoleNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// Wraps the failure of a single step, naming the step
    #[error("Step {step} ({role} -> {output_key}) failed: {source}")]
    Step {
        /// 1-based position of the failing step
        step: usize,
        role: String,
        output_key: String,
        source: Box<DevTeamError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DevTeamError {
    /// Create a completion backend failure
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion(message.into())
    }

    /// Create a parse failure for the named shape
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an invalid workflow error
    pub fn invalid_workflow(message: impl Into<String>) -> Self {
        Self::InvalidWorkflow(message.into())
    }

    /// Wrap `source` as the failure of step `step`
    pub fn at_step(
        step: usize,
        role: impl Into<String>,
        output_key: impl Into<String>,
        source: DevTeamError,
    ) -> Self {
        Self::Step {
            step,
            role: role.into(),
            output_key: output_key.into(),
            source: Box::new(source),
        }
    }

    /// The underlying error with any step wrappers removed
    pub fn root_cause(&self) -> &DevTeamError {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// 1-based index of the failing step, when the error came from a step
    pub fn failed_step(&self) -> Option<usize> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_names_step_and_reason() {
        let err = DevTeamError::at_step(
            2,
            "frontend-developer",
            "frontend_code",
            DevTeamError::RoleNotFound("frontend-developer".to_string()),
        );

        let message = err.to_string();
        assert!(message.contains("Step 2"));
        assert!(message.contains("frontend_code"));
        assert!(message.contains("Role not found: frontend-developer"));
        assert_eq!(err.failed_step(), Some(2));
    }

    #[test]
    fn test_root_cause_unwraps_nested_steps() {
        let inner = DevTeamError::BudgetExceeded {
            spent: 0.02,
            limit: 0.01,
        };
        let err = DevTeamError::at_step(1, "pm", "requirements", inner);

        assert!(matches!(
            err.root_cause(),
            DevTeamError::BudgetExceeded { .. }
        ));
    }

    #[test]
    fn test_budget_message_format() {
        let err = DevTeamError::BudgetExceeded {
            spent: 0.02,
            limit: 0.01,
        };
        assert_eq!(err.to_string(), "Cost limit exceeded: $0.0200 > $0.01");
    }
}
