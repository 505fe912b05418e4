use serde::{Deserialize, Serialize};

/// One schema-conformance violation: where in the document, and what went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ElicitError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Compilation failed after {attempts} attempt(s): {message}")]
    CompilationFailed { attempts: u32, message: String },

    #[error("Validation failed with {} violation(s)", violations.len())]
    ValidationFailed { violations: Vec<SchemaViolation> },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ElicitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ElicitError::NotFound("question q1".to_string());
        assert_eq!(err.to_string(), "Not found: question q1");
    }

    #[test]
    fn test_compilation_failed_reports_attempts() {
        let err = ElicitError::CompilationFailed {
            attempts: 3,
            message: "unparseable output".to_string(),
        };
        assert!(err.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn test_validation_failed_counts_violations() {
        let err = ElicitError::ValidationFailed {
            violations: vec![
                SchemaViolation {
                    path: "/acceptance".to_string(),
                    message: "required property missing".to_string(),
                },
                SchemaViolation {
                    path: "/plan".to_string(),
                    message: "required property missing".to_string(),
                },
            ],
        };
        assert!(err.to_string().contains("2 violation(s)"));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ElicitError = serde_err.into();
        assert!(matches!(err, ElicitError::Serde(_)));
    }
}
