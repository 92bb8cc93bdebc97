//! Native gate representation
//!
//! The engine consumes a closed, tagged gate form: an ordered list of
//! target qubits plus a dense `2^k x 2^k` matrix. Translation from any
//! richer host gate model happens upstream; by the time a [`Gate`] exists
//! it is numerically concrete and immutable.
//!
//! Index convention: the first listed target qubit occupies the most
//! significant bit of the matrix row/column index. The same convention is
//! used for the global state index, where qubit 0 is the most significant
//! bit.

use crate::error::{CircuitError, Result};
use crate::matrix;
use num_complex::Complex64;
use smallvec::SmallVec;
use std::f64::consts::PI;
use std::fmt;

/// Largest qubit count a single dense block may act on
///
/// Gates above this arity are rejected outright; decomposing them is the
/// translator's job, not the engine's.
pub const MAX_BLOCK_QUBITS: usize = 6;

/// A concrete unitary (or, during trajectory realization, a Kraus
/// operator) acting on an ordered set of target qubits
#[derive(Clone)]
pub struct Gate {
    qubits: SmallVec<[usize; 2]>,
    matrix: Vec<Complex64>,
    global_phase: Option<f64>,
}

impl Gate {
    /// Create a gate from target qubits and a row-major dense matrix
    ///
    /// # Errors
    /// - `UnsupportedGate` if more than [`MAX_BLOCK_QUBITS`] targets
    /// - `DuplicateQubit` if a target repeats
    /// - `DimensionMismatch` if the matrix is not `2^k x 2^k`
    pub fn new(qubits: &[usize], matrix: Vec<Complex64>) -> Result<Self> {
        if qubits.is_empty() {
            return Err(CircuitError::EmptyOperation("gate has no targets".into()));
        }
        if qubits.len() > MAX_BLOCK_QUBITS {
            return Err(CircuitError::UnsupportedGate {
                arity: qubits.len(),
                max: MAX_BLOCK_QUBITS,
            });
        }
        for (i, &q) in qubits.iter().enumerate() {
            if qubits[..i].contains(&q) {
                return Err(CircuitError::DuplicateQubit(q));
            }
        }
        let dim = matrix::dim_for(qubits.len());
        if matrix.len() != dim * dim {
            return Err(CircuitError::DimensionMismatch {
                expected: dim * dim,
                actual: matrix.len(),
            });
        }
        Ok(Self {
            qubits: SmallVec::from_slice(qubits),
            matrix,
            global_phase: None,
        })
    }

    /// Target qubits in application order (first = most significant bit)
    #[inline]
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// Gate arity
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Matrix side length, `2^k`
    #[inline]
    pub fn dim(&self) -> usize {
        matrix::dim_for(self.qubits.len())
    }

    /// Row-major dense matrix
    #[inline]
    pub fn matrix(&self) -> &[Complex64] {
        &self.matrix
    }

    /// Global phase recorded on this gate, if any
    #[inline]
    pub fn global_phase(&self) -> Option<f64> {
        self.global_phase
    }

    /// Multiply the matrix by `e^(i*phase)` and record the phase
    pub fn with_global_phase(mut self, phase: f64) -> Self {
        let factor = Complex64::from_polar(1.0, phase);
        for entry in &mut self.matrix {
            *entry *= factor;
        }
        self.global_phase = Some(match self.global_phase {
            Some(existing) => existing + phase,
            None => phase,
        });
        self
    }

    /// Expand this gate into its controlled form
    ///
    /// The result acts on `controls ++ targets`; the original matrix is
    /// applied only where every control qubit carries its required value,
    /// and the identity elsewhere.
    pub fn controlled(&self, controls: &[usize], values: &[bool]) -> Result<Self> {
        if controls.is_empty() {
            return Err(CircuitError::EmptyOperation("no control qubits".into()));
        }
        if controls.len() != values.len() {
            return Err(CircuitError::DimensionMismatch {
                expected: controls.len(),
                actual: values.len(),
            });
        }
        let nc = controls.len();
        let k = self.num_qubits();
        let mut all: Vec<usize> = controls.to_vec();
        all.extend_from_slice(&self.qubits);

        let gate_dim = self.dim();
        let mut required = 0usize;
        for (m, &v) in values.iter().enumerate() {
            if v {
                required |= 1 << (nc - 1 - m);
            }
        }

        let dim = matrix::dim_for(nc + k);
        let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
        for row in 0..dim {
            let ctrl = row >> k;
            let sub_row = row & (gate_dim - 1);
            if ctrl == required {
                for sub_col in 0..gate_dim {
                    let col = (ctrl << k) | sub_col;
                    out[row * dim + col] = self.matrix[sub_row * gate_dim + sub_col];
                }
            } else {
                out[row * dim + row] = Complex64::new(1.0, 0.0);
            }
        }
        Gate::new(&all, out)
    }

    /// Controlled form where each control declares its qudit dimension
    ///
    /// Binary controls behave like [`Gate::controlled`]. Any control with
    /// dimension above 2 cannot be simulated here; the whole control
    /// configuration is treated as never satisfied and the gate collapses
    /// to the identity on its qubits, with a warning.
    pub fn controlled_with_dimensions(
        &self,
        controls: &[usize],
        values: &[u64],
        dimensions: &[u64],
    ) -> Result<Self> {
        if controls.len() != values.len() || controls.len() != dimensions.len() {
            return Err(CircuitError::DimensionMismatch {
                expected: controls.len(),
                actual: values.len().max(dimensions.len()),
            });
        }
        if dimensions.iter().any(|&d| d > 2) {
            log::warn!(
                "control dimensions {:?} include a qudit control; \
                 treating the control condition as never satisfied",
                dimensions
            );
            let mut all: Vec<usize> = controls.to_vec();
            all.extend_from_slice(&self.qubits);
            let dim = matrix::dim_for(all.len());
            return Gate::new(&all, matrix::identity(dim));
        }
        let bools: Vec<bool> = values.iter().map(|&v| v != 0).collect();
        self.controlled(controls, &bools)
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("qubits", &self.qubits)
            .field("dim", &self.dim())
            .field("global_phase", &self.global_phase)
            .finish()
    }
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

// Standard single-qubit gates.
impl Gate {
    pub fn x(qubit: usize) -> Self {
        Self::one_qubit(qubit, [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)])
    }

    pub fn y(qubit: usize) -> Self {
        Self::one_qubit(qubit, [c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0)])
    }

    pub fn z(qubit: usize) -> Self {
        Self::one_qubit(qubit, [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)])
    }

    pub fn h(qubit: usize) -> Self {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        Self::one_qubit(qubit, [c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0)])
    }

    pub fn s(qubit: usize) -> Self {
        Self::one_qubit(qubit, [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 1.0)])
    }

    pub fn t(qubit: usize) -> Self {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        Self::one_qubit(qubit, [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(s, s)])
    }

    /// `X^t`, including the conventional global phase `e^(i*pi*t/2)`
    ///
    /// `x_pow(q, 1.0)` is exactly X; `x_pow(q, 0.5)` is the square root
    /// of X.
    pub fn x_pow(qubit: usize, exponent: f64) -> Self {
        let half = PI * exponent / 2.0;
        let phase = Complex64::from_polar(1.0, half);
        let cos = c(half.cos(), 0.0);
        let msin = c(0.0, -half.sin());
        Self::one_qubit(
            qubit,
            [phase * cos, phase * msin, phase * msin, phase * cos],
        )
    }

    /// `Y^t`, including the conventional global phase `e^(i*pi*t/2)`
    pub fn y_pow(qubit: usize, exponent: f64) -> Self {
        let half = PI * exponent / 2.0;
        let phase = Complex64::from_polar(1.0, half);
        let cos = c(half.cos(), 0.0);
        let sin = c(half.sin(), 0.0);
        Self::one_qubit(qubit, [phase * cos, -phase * sin, phase * sin, phase * cos])
    }

    /// `Z^t`: diag(1, e^(i*pi*t))
    pub fn z_pow(qubit: usize, exponent: f64) -> Self {
        let phase = Complex64::from_polar(1.0, PI * exponent);
        Self::one_qubit(qubit, [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), phase])
    }

    /// Square root of X
    pub fn sqrt_x(qubit: usize) -> Self {
        Self::x_pow(qubit, 0.5)
    }

    /// Square root of Y
    pub fn sqrt_y(qubit: usize) -> Self {
        Self::y_pow(qubit, 0.5)
    }

    /// Rotation about X: `e^(-i*theta*X/2)`
    pub fn rx(qubit: usize, theta: f64) -> Self {
        let half = theta / 2.0;
        Self::one_qubit(
            qubit,
            [
                c(half.cos(), 0.0),
                c(0.0, -half.sin()),
                c(0.0, -half.sin()),
                c(half.cos(), 0.0),
            ],
        )
    }

    /// Rotation about Y: `e^(-i*theta*Y/2)`
    pub fn ry(qubit: usize, theta: f64) -> Self {
        let half = theta / 2.0;
        Self::one_qubit(
            qubit,
            [
                c(half.cos(), 0.0),
                c(-half.sin(), 0.0),
                c(half.sin(), 0.0),
                c(half.cos(), 0.0),
            ],
        )
    }

    /// Rotation about Z: `e^(-i*theta*Z/2)`
    pub fn rz(qubit: usize, theta: f64) -> Self {
        let half = theta / 2.0;
        Self::one_qubit(
            qubit,
            [
                Complex64::from_polar(1.0, -half),
                c(0.0, 0.0),
                c(0.0, 0.0),
                Complex64::from_polar(1.0, half),
            ],
        )
    }

    fn one_qubit(qubit: usize, m: [Complex64; 4]) -> Self {
        Self {
            qubits: SmallVec::from_slice(&[qubit]),
            matrix: m.to_vec(),
            global_phase: None,
        }
    }
}

// Standard two-qubit gates.
impl Gate {
    pub fn cnot(control: usize, target: usize) -> Result<Self> {
        Self::x(target).controlled(&[control], &[true])
    }

    pub fn cz(qubit_a: usize, qubit_b: usize) -> Result<Self> {
        Self::z(qubit_b).controlled(&[qubit_a], &[true])
    }

    /// Controlled phase: diag(1, 1, 1, e^(i*theta))
    pub fn cphase(qubit_a: usize, qubit_b: usize, theta: f64) -> Result<Self> {
        Self::one_qubit(
            qubit_b,
            [
                c(1.0, 0.0),
                c(0.0, 0.0),
                c(0.0, 0.0),
                Complex64::from_polar(1.0, theta),
            ],
        )
        .controlled(&[qubit_a], &[true])
    }

    pub fn swap(qubit_a: usize, qubit_b: usize) -> Result<Self> {
        let mut m = vec![c(0.0, 0.0); 16];
        m[0] = c(1.0, 0.0);
        m[1 * 4 + 2] = c(1.0, 0.0);
        m[2 * 4 + 1] = c(1.0, 0.0);
        m[3 * 4 + 3] = c(1.0, 0.0);
        Gate::new(&[qubit_a, qubit_b], m)
    }

    pub fn iswap(qubit_a: usize, qubit_b: usize) -> Result<Self> {
        let mut m = vec![c(0.0, 0.0); 16];
        m[0] = c(1.0, 0.0);
        m[1 * 4 + 2] = c(0.0, 1.0);
        m[2 * 4 + 1] = c(0.0, 1.0);
        m[3 * 4 + 3] = c(1.0, 0.0);
        Gate::new(&[qubit_a, qubit_b], m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{adjoint, is_identity, multiply};
    use approx::assert_relative_eq;

    #[test]
    fn test_new_rejects_oversized_gate() {
        let dim = 1 << 7;
        let m = crate::matrix::identity(dim);
        let err = Gate::new(&[0, 1, 2, 3, 4, 5, 6], m).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::UnsupportedGate { arity: 7, max: 6 }
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_target() {
        let m = crate::matrix::identity(4);
        let err = Gate::new(&[1, 1], m).unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateQubit(1)));
    }

    #[test]
    fn test_new_rejects_wrong_matrix_length() {
        let err = Gate::new(&[0], vec![Complex64::new(1.0, 0.0); 3]).unwrap_err();
        assert!(matches!(err, CircuitError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_x_pow_full_power_is_x() {
        let g = Gate::x_pow(0, 1.0);
        let x = Gate::x(0);
        for (a, b) in g.matrix().iter().zip(x.matrix()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sqrt_x_squares_to_x() {
        let g = Gate::sqrt_x(0);
        let squared = multiply(g.matrix(), g.matrix(), 2);
        let x = Gate::x(0);
        for (a, b) in squared.iter().zip(x.matrix()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sqrt_x_amplitude_entries() {
        // Matches the conventional sqrt(X): all entries 0.5*(1 +/- i).
        let g = Gate::sqrt_x(0);
        assert_relative_eq!(g.matrix()[0].re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[0].im, 0.5, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[1].re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[1].im, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_standard_gates_are_unitary() {
        for g in [
            Gate::x(0),
            Gate::y(0),
            Gate::z(0),
            Gate::h(0),
            Gate::s(0),
            Gate::t(0),
            Gate::x_pow(0, 0.3),
            Gate::y_pow(0, 0.7),
            Gate::z_pow(0, 1.3),
            Gate::rx(0, 0.4),
            Gate::ry(0, 1.1),
            Gate::rz(0, 2.2),
        ] {
            let dag = adjoint(g.matrix(), 2);
            assert!(is_identity(&multiply(g.matrix(), &dag, 2), 2, 1e-10));
        }
    }

    #[test]
    fn test_cnot_flips_on_control() {
        let g = Gate::cnot(0, 1).unwrap();
        assert_eq!(g.qubits(), &[0, 1]);
        // |10> -> |11>
        assert_relative_eq!(g.matrix()[3 * 4 + 2].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[2 * 4 + 3].re, 1.0, epsilon = 1e-12);
        // |00>, |01> untouched
        assert_relative_eq!(g.matrix()[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[1 * 4 + 1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cz_phases_only_one_one() {
        let g = Gate::cz(0, 1).unwrap();
        assert_relative_eq!(g.matrix()[3 * 4 + 3].re, -1.0, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[0].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_controlled_off_value() {
        // X on target when control is |0>.
        let g = Gate::x(1).controlled(&[0], &[false]).unwrap();
        // |00> -> |01>
        assert_relative_eq!(g.matrix()[1 * 4 + 0].re, 1.0, epsilon = 1e-12);
        // |10>, |11> untouched
        assert_relative_eq!(g.matrix()[2 * 4 + 2].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[3 * 4 + 3].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_qudit_control_neutralizes_to_identity() {
        let g = Gate::x(1)
            .controlled_with_dimensions(&[0], &[2], &[3])
            .unwrap();
        assert_eq!(g.qubits(), &[0, 1]);
        assert!(is_identity(g.matrix(), 4, 1e-12));
    }

    #[test]
    fn test_with_global_phase() {
        let g = Gate::z(0).with_global_phase(PI / 2.0);
        assert_eq!(g.global_phase(), Some(PI / 2.0));
        assert_relative_eq!(g.matrix()[0].im, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.matrix()[3].im, -1.0, epsilon = 1e-12);
    }
}
