//! Dense state-vector storage
//!
//! A state over n qubits is a contiguous vector of `2^n` complex
//! amplitudes. Qubit 0 occupies the most significant bit of the state
//! index, so for three qubits the index `0b100` is the basis state with
//! qubit 0 set and the rest clear.

use crate::error::{Result, StateError};
use num_complex::Complex64;

/// Dense complex amplitude vector over a fixed qubit count
#[derive(Debug, Clone)]
pub struct StateVector {
    num_qubits: usize,
    amps: Vec<Complex64>,
}

impl StateVector {
    /// The all-zeros computational basis state
    pub fn new(num_qubits: usize) -> Result<Self> {
        Self::from_basis_index(num_qubits, 0)
    }

    /// A single computational basis state
    pub fn from_basis_index(num_qubits: usize, index: u64) -> Result<Self> {
        if num_qubits >= 64 {
            return Err(StateError::TooManyQubits(num_qubits));
        }
        let dim = 1usize << num_qubits;
        if index as usize >= dim {
            return Err(StateError::DimensionMismatch {
                expected: dim,
                actual: index as usize + 1,
            });
        }
        let mut amps = vec![Complex64::new(0.0, 0.0); dim];
        amps[index as usize] = Complex64::new(1.0, 0.0);
        Ok(Self { num_qubits, amps })
    }

    /// Adopt a caller-supplied amplitude vector
    ///
    /// The vector is taken as-is; callers wanting a normalized state
    /// should call [`StateVector::normalize`] afterwards.
    pub fn from_amplitudes(num_qubits: usize, amps: Vec<Complex64>) -> Result<Self> {
        if num_qubits >= 64 {
            return Err(StateError::TooManyQubits(num_qubits));
        }
        let dim = 1usize << num_qubits;
        if amps.len() != dim {
            return Err(StateError::DimensionMismatch {
                expected: dim,
                actual: amps.len(),
            });
        }
        Ok(Self { num_qubits, amps })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.amps.len()
    }

    #[inline]
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    #[inline]
    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amps
    }

    /// Amplitude of one basis state
    #[inline]
    pub fn amplitude(&self, index: u64) -> Complex64 {
        self.amps[index as usize]
    }

    /// Probability of one basis state
    #[inline]
    pub fn probability(&self, index: u64) -> f64 {
        self.amps[index as usize].norm_sqr()
    }

    /// Squared Euclidean norm of the amplitude vector
    pub fn norm_sqr(&self) -> f64 {
        self.amps.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Rescale to unit norm
    ///
    /// # Errors
    /// `ZeroNormCollapse` if the state has (numerically) zero norm.
    pub fn normalize(&mut self) -> Result<()> {
        let norm = self.norm();
        if norm <= f64::EPSILON {
            return Err(StateError::ZeroNormCollapse);
        }
        let inv = 1.0 / norm;
        for amp in &mut self.amps {
            *amp *= inv;
        }
        Ok(())
    }

    pub fn is_normalized(&self, epsilon: f64) -> bool {
        (self.norm_sqr() - 1.0).abs() <= epsilon
    }

    /// Value of qubit `qubit` within basis index `index`
    ///
    /// Qubit 0 is the most significant bit.
    #[inline]
    pub fn qubit_bit(&self, index: usize, qubit: usize) -> u8 {
        ((index >> (self.num_qubits - 1 - qubit)) & 1) as u8
    }
}
