use thiserror::Error;

use crate::validation::ValidationReport;

/// Failure taxonomy shared by every generation step.
///
/// The `Display` form of each variant is the message reported in the step's
/// result, so it is phrased for the person who submitted the request.
#[derive(Debug, Error)]
pub enum StepError {
    /// Malformed field schema or role-permission input.
    #[error("invalid input: {0}")]
    Validation(ValidationReport),
    /// An artifact the scaffold generator should have produced is absent.
    #[error("{0}")]
    ArtifactMissing(String),
    /// An anchor was not found or a rewrite changed nothing.
    #[error("Failed to modify {artifact}: {reason}")]
    Mutation { artifact: String, reason: String },
    /// The external console (scaffold, migrate, seed) exited unsuccessfully.
    #[error("{0}")]
    Execution(String),
    /// A result channel wait exceeded its bound.
    #[error("Operation timed out after {seconds} seconds.")]
    Timeout { seconds: u64 },
    /// Catch-all for unexpected failures, including panics inside a step.
    #[error("{0}")]
    Unhandled(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StepError {
    pub fn mutation(artifact: impl Into<String>, reason: impl ToString) -> Self {
        Self::Mutation {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ArtifactMissing(_) => "artifact_missing",
            Self::Mutation { .. } => "mutation",
            Self::Execution(_) => "execution",
            Self::Timeout { .. } => "timeout",
            Self::Unhandled(_) | Self::Io(_) | Self::Json(_) => "unhandled",
        }
    }
}

/// Convenience alias for results returned by Resourcery crates.
pub type Result<T> = std::result::Result<T, StepError>;
