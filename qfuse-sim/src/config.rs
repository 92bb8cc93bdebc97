//! Simulator configuration
//!
//! Builder-style knobs with a single validation gate. Thread counts and
//! verbosity only affect scheduling and logging; seeds and the fusion
//! ceiling are the only fields with observable numerical consequences,
//! and fusion itself is exact, so results are invariant under the ceiling
//! too.

use crate::error::{Result, SimulatorError};
use qfuse_core::MAX_BLOCK_QUBITS;

/// Smallest useful fusion ceiling; below this fusion degenerates to
/// passthrough
pub const MIN_FUSED_QUBITS: usize = 2;

/// Tuning and reproducibility knobs for [`crate::Simulator`]
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Worker threads for amplitude updates; 0 means rayon's default
    pub num_threads: usize,
    /// Fusion ceiling: largest qubit count a fused block may reach
    pub max_fused_qubits: usize,
    /// Log verbosity level; higher is chattier
    pub verbosity: u8,
    /// Master RNG seed; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            max_fused_qubits: 2,
            verbosity: 0,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_max_fused_qubits(mut self, max_fused_qubits: usize) -> Self {
        self.max_fused_qubits = max_fused_qubits;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<()> {
        if !(MIN_FUSED_QUBITS..=MAX_BLOCK_QUBITS).contains(&self.max_fused_qubits) {
            return Err(SimulatorError::InvalidConfig(format!(
                "max_fused_qubits {} outside {}..={}",
                self.max_fused_qubits, MIN_FUSED_QUBITS, MAX_BLOCK_QUBITS
            )));
        }
        Ok(())
    }
}
