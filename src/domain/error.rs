// ============================================================
// Layer 3 - Domain Errors
// ============================================================
// Typed failures raised by configuration checks and by the
// weight-import path. Everything above the domain (infra,
// application, CLI) wraps these into anyhow::Error with
// extra context; the model layer returns them verbatim so
// callers can match on the failure kind.

use thiserror::Error;

/// Result alias for fallible domain and model operations.
pub type VitResult<T> = std::result::Result<T, VitError>;

#[derive(Debug, Error)]
pub enum VitError {
    /// hidden_size must split evenly across the attention heads
    #[error("hidden_size ({hidden_size}) is not divisible by num_heads ({num_heads})")]
    HeadsDoNotDivide { hidden_size: usize, num_heads: usize },

    /// Any other out-of-range hyperparameter
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    /// The external weight table has no entry for this key
    #[error("weight '{0}' not found in the external table")]
    MissingKey(String),

    /// Source tensor cannot be assigned to the destination parameter
    #[error("shape mismatch for '{key}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        key:      String,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    /// Flat data buffer does not fill the declared shape
    #[error("data length {len} does not match shape {shape:?}")]
    DataLength { len: usize, shape: Vec<usize> },
}
