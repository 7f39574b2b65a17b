use thiserror::Error;

/// Result type for optimizer entry points.
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Precondition failures. All of them are raised before any search loop runs,
/// so a failed call never yields a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The price series has no ticks.
    #[error("price series is empty")]
    EmptyInput,
    /// The series is too short for the requested algorithm.
    #[error("price series too short: need at least {required} ticks, got {actual}")]
    InsufficientLength { required: usize, actual: usize },
    /// The battery configuration violates its invariants.
    #[error("invalid battery config: {0}")]
    InvalidConfig(String),
}
