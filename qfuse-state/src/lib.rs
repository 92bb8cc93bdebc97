//! Dense state-vector engine
//!
//! Storage, the dense block-application kernel, sampling and measurement
//! collapse. Everything operating on amplitudes lives here; circuit-level
//! orchestration (fusion, trajectories, sweeps) sits in the simulation
//! crate on top.

pub mod apply;
pub mod error;
pub mod measure;
pub mod state_vector;

pub use apply::apply_block;
pub use error::{Result, StateError};
pub use measure::{measure_subset, sample_indices};
pub use state_vector::StateVector;
