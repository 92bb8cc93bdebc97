//! Error types for state-vector operations

use thiserror::Error;

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised while allocating or transforming a state vector
#[derive(Debug, Error)]
pub enum StateError {
    /// Qubit count would overflow the amplitude index space
    #[error("cannot allocate state for {0} qubits")]
    TooManyQubits(usize),

    /// An amplitude vector has the wrong length for its qubit count
    #[error("state dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Qubit index outside the state's range
    #[error("invalid qubit index {index}: state has {num_qubits} qubits")]
    InvalidQubitIndex { index: usize, num_qubits: usize },

    /// A measurement outcome left the state with zero norm
    #[error("measurement collapse produced a zero-norm state")]
    ZeroNormCollapse,
}
