//! Circuit simulation engines
//!
//! The simulation layer on top of [`qfuse_state`]: gate fusion, the
//! configured dense simulator with trajectory sampling and parameter
//! sweeps, and the cut-based hybrid amplitude engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod hybrid;
pub mod result;
pub mod simulator;

pub use config::SimulatorConfig;
pub use error::{Result, SimulatorError};
pub use fusion::{fuse, FusionPlan, PlanSlot, Slot};
pub use hybrid::{HybridConfig, HybridSimulator};
pub use result::RunResult;
pub use simulator::{InitialState, Simulator};
