//! Centralized error types for the pipeline.

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum XrayError {
    /// A stage input or a model answer does not satisfy its contract.
    #[error("Validation error ({contract}): {message}")]
    Validation { contract: String, message: String },

    /// The external model call failed.
    #[error("Model invocation failed ({prompt}): {message}")]
    ModelInvocation { prompt: String, message: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type XrayResult<T> = Result<T, XrayError>;

impl XrayError {
    /// Create a validation error for the named contract.
    pub fn validation(contract: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            contract: contract.into(),
            message: message.into(),
        }
    }

    /// Create a model invocation error for the named prompt.
    pub fn model_invocation(prompt: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            prompt: prompt.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for the two fatal stage failures (`Validation`, `ModelInvocation`).
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::ModelInvocation { .. })
    }
}
