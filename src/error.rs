//! Error types shared across the crate.
//!
//! Representation errors are programmer errors and surface synchronously.
//! Solver and store errors are always absorbed by the orchestration and
//! control layers and turned into result objects or log lines.

/// Errors raised by the genetic representation types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepresentationError {
    /// Cell coordinates fall outside the chromosome grid.
    #[error("cell ({resident}, {block}) out of bounds for {rows}x{cols} chromosome")]
    OutOfBounds {
        resident: usize,
        block: usize,
        rows: usize,
        cols: usize,
    },

    /// Resident row index falls outside the chromosome grid.
    #[error("resident {resident} out of bounds for {rows} residents")]
    ResidentOutOfBounds { resident: usize, rows: usize },

    /// Two chromosomes with different shapes were compared or recombined.
    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// A rotation id larger than the template count was written.
    #[error("rotation id {value} exceeds template count {max}")]
    InvalidRotation { value: u32, max: u32 },

    /// A grid's cell count does not match its declared shape.
    #[error("expected {expected} cells for the declared shape, got {actual}")]
    CellCount { expected: usize, actual: usize },

    /// A fitness array had the wrong number of slots.
    #[error("expected {expected} fitness values, got {actual}")]
    ArrayLength { expected: usize, actual: usize },

    /// Random fill density outside `[0, 1]`.
    #[error("density must be in [0, 1], got {0}")]
    InvalidDensity(f64),
}

/// Error returned by a solver instance.
///
/// Every variant is converted into a failed
/// [`SolverResult`](crate::parallel::SolverResult) by the parallel
/// orchestrator; none of them abort sibling instances.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// The solver ran but could not produce a solution.
    #[error("solver failed: {0}")]
    Failed(String),

    /// The solver observed its cancellation flag and stopped.
    #[error("cancelled")]
    Cancelled,

    /// The problem data was unusable for this solver.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from a [`KeyValueStore`](crate::control::KeyValueStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A key holds a value of a different kind (string vs. field map).
    #[error("wrong value type at key {0}")]
    WrongType(String),

    /// Stored payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
