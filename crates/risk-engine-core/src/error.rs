use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskEngineError {
    #[error("Invalid parameters: {field} — {reason}")]
    InvalidParameters { field: String, reason: String },

    #[error("Invalid correlation matrix: {0}")]
    InvalidCorrelationMatrix(String),

    #[error("Degenerate tolerance input: {0}")]
    DegenerateToleranceInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RiskEngineError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskEngineError::InvalidParameters {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RiskEngineError {
    fn from(e: serde_json::Error) -> Self {
        RiskEngineError::SerializationError(e.to_string())
    }
}
