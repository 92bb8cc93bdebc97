//! Error types for the simulation layer

use qfuse_core::CircuitError;
use qfuse_state::StateError;
use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;

/// Errors raised while configuring or running a simulation
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// A configuration field is out of its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The circuit itself is malformed
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    /// A state-level operation failed
    #[error(transparent)]
    State(#[from] StateError),

    /// The supplied initial state does not match the circuit
    #[error("initial state does not fit the circuit: {0}")]
    InvalidInitialState(String),

    /// The requested engine cannot run this circuit
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}
