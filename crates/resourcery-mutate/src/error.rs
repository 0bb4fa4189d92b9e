use thiserror::Error;

/// Reasons a mutation could not be applied.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The anchor does not occur in the document.
    #[error("anchor not found: {0}")]
    AnchorNotFound(String),
    /// The block following an anchor has no matching closing brace.
    #[error("unbalanced block after {0}")]
    UnbalancedBlock(String),
    /// The class body has no closing brace.
    #[error("class closing brace not found")]
    ClassCloseNotFound,
    /// The rewrite produced identical text.
    #[error("mutation changed nothing: {0}")]
    NoOp(String),
    #[error("invalid anchor pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, MutationError>;
