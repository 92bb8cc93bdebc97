//! Core circuit representation for the qfuse simulator
//!
//! This crate defines the data the engines consume: dense-matrix gates,
//! noise channels, measurements, circuits and parameterized circuit
//! templates. All validation happens here, at construction time, so the
//! state and simulation crates operate on trusted input.

pub mod channel;
pub mod circuit;
pub mod error;
pub mod gate;
pub mod matrix;
pub mod param;

pub use channel::{Channel, ChannelKind, MixtureComponent};
pub use circuit::{Circuit, Measurement, Operation};
pub use error::{CircuitError, Result};
pub use gate::{Gate, MAX_BLOCK_QUBITS};
pub use param::{Binding, Param, ParamCircuit, ParamOp};
