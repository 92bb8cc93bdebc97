//! Error types for circuit construction

use thiserror::Error;

/// Result type for circuit operations
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Errors raised while building gates, channels or circuits
///
/// Everything here is detected eagerly, at construction time, before any
/// amplitude memory is committed.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// Gate arity exceeds the dense-block ceiling
    #[error("unsupported operation: gate acts on {arity} qubits, dense block limit is {max}")]
    UnsupportedGate { arity: usize, max: usize },

    /// A matrix or vector has the wrong length for its declared arity
    #[error("dimension mismatch: expected length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Qubit index outside the circuit's range
    #[error("invalid qubit index {qubit}: circuit has {num_qubits} qubits")]
    InvalidQubit { qubit: usize, num_qubits: usize },

    /// The same qubit appears twice in one operation
    #[error("duplicate qubit {0} in operation")]
    DuplicateQubit(usize),

    /// A mixture probability is out of range or the mixture does not sum to 1
    #[error("invalid probability {value}: {reason}")]
    InvalidProbability { value: f64, reason: String },

    /// Kraus operators fail the completeness relation sum(K^dag K) = I
    #[error("Kraus operators violate completeness, deviation {deviation:.3e}")]
    IncompleteKraus { deviation: f64 },

    /// A symbolic parameter has no value in the supplied binding
    #[error("unbound symbol '{0}' in parameter binding")]
    UnboundSymbol(String),

    /// An operation list is empty where at least one entry is required
    #[error("empty operation: {0}")]
    EmptyOperation(String),
}
