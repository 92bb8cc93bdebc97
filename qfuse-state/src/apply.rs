//! Dense block application kernel
//!
//! Applies a `2^k x 2^k` matrix to k target qubits of the state vector.
//! The state index space splits into `2^(n-k)` disjoint groups of `2^k`
//! amplitudes each; every group is an independent matrix-vector product,
//! which is what makes the rayon split below safe.
//!
//! The kernel does not assume the matrix is unitary and never
//! renormalizes. Trajectory sampling relies on this to read the induced
//! probability of a Kraus branch off the squared norm of the raw result.

use crate::error::{Result, StateError};
use crate::state_vector::StateVector;
use num_complex::Complex64;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Below this many amplitudes the serial loop wins
const PARALLEL_THRESHOLD: usize = 1 << 12;

/// Shared mutable amplitude base pointer for the parallel path
///
/// Safety rests on the group structure: distinct outer indices expand to
/// disjoint amplitude sets, so concurrent tasks never alias.
struct AmpPtr(*mut Complex64);
unsafe impl Send for AmpPtr {}
unsafe impl Sync for AmpPtr {}

/// Apply a dense matrix to the given target qubits
///
/// `targets` are in gate order: the first target is the most significant
/// bit of the matrix row index. The matrix need not be unitary.
pub fn apply_block(state: &mut StateVector, targets: &[usize], matrix: &[Complex64]) -> Result<()> {
    let n = state.num_qubits();
    let k = targets.len();
    for &q in targets {
        if q >= n {
            return Err(StateError::InvalidQubitIndex {
                index: q,
                num_qubits: n,
            });
        }
    }
    let gate_dim = 1usize << k;
    if matrix.len() != gate_dim * gate_dim {
        return Err(StateError::DimensionMismatch {
            expected: gate_dim * gate_dim,
            actual: matrix.len(),
        });
    }

    // Bit position of each target inside the state index, gate order.
    let positions: SmallVec<[usize; 6]> = targets.iter().map(|&q| n - 1 - q).collect();

    // Offset of each matrix sub-index from the group's base index.
    let mut offsets: SmallVec<[usize; 64]> = SmallVec::with_capacity(gate_dim);
    for sub in 0..gate_dim {
        let mut offset = 0usize;
        for (j, &pos) in positions.iter().enumerate() {
            offset |= ((sub >> (k - 1 - j)) & 1) << pos;
        }
        offsets.push(offset);
    }

    // Ascending target bit positions for outer-index expansion.
    let mut sorted_positions = positions.clone();
    sorted_positions.sort_unstable();

    let num_outer = 1usize << (n - k);
    let expand = |outer: usize| -> usize {
        let mut idx = outer;
        for &bit in &sorted_positions {
            let low = idx & ((1 << bit) - 1);
            idx = ((idx >> bit) << (bit + 1)) | low;
        }
        idx
    };

    let amps = state.amplitudes_mut();
    if amps.len() >= PARALLEL_THRESHOLD {
        let base = AmpPtr(amps.as_mut_ptr());
        (0..num_outer).into_par_iter().for_each(|outer| {
            let base_index = expand(outer);
            let ptr = &base;
            let mut scratch: SmallVec<[Complex64; 64]> = SmallVec::with_capacity(gate_dim);
            unsafe {
                for &offset in &offsets {
                    scratch.push(*ptr.0.add(base_index + offset));
                }
                for row in 0..gate_dim {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for col in 0..gate_dim {
                        acc += matrix[row * gate_dim + col] * scratch[col];
                    }
                    *ptr.0.add(base_index + offsets[row]) = acc;
                }
            }
        });
    } else {
        let mut scratch: SmallVec<[Complex64; 64]> = SmallVec::with_capacity(gate_dim);
        for outer in 0..num_outer {
            let base_index = expand(outer);
            scratch.clear();
            for &offset in &offsets {
                scratch.push(amps[base_index + offset]);
            }
            for row in 0..gate_dim {
                let mut acc = Complex64::new(0.0, 0.0);
                for col in 0..gate_dim {
                    acc += matrix[row * gate_dim + col] * scratch[col];
                }
                amps[base_index + offsets[row]] = acc;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn x_matrix() -> Vec<Complex64> {
        vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)]
    }

    fn h_matrix() -> Vec<Complex64> {
        let s = FRAC_1_SQRT_2;
        vec![c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0)]
    }

    #[test]
    fn test_x_on_high_qubit() {
        let mut state = StateVector::new(3).unwrap();
        apply_block(&mut state, &[0], &x_matrix()).unwrap();
        assert_relative_eq!(state.probability(0b100), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_x_on_low_qubit() {
        let mut state = StateVector::new(3).unwrap();
        apply_block(&mut state, &[2], &x_matrix()).unwrap();
        assert_relative_eq!(state.probability(0b001), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hadamard_superposition() {
        let mut state = StateVector::new(2).unwrap();
        apply_block(&mut state, &[0], &h_matrix()).unwrap();
        assert_relative_eq!(state.probability(0b00), 0.5, epsilon = 1e-12);
        assert_relative_eq!(state.probability(0b10), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_two_qubit_cnot_target_order() {
        // CNOT with control as first target.
        let mut cnot = vec![c(0.0, 0.0); 16];
        cnot[0] = c(1.0, 0.0);
        cnot[1 * 4 + 1] = c(1.0, 0.0);
        cnot[2 * 4 + 3] = c(1.0, 0.0);
        cnot[3 * 4 + 2] = c(1.0, 0.0);

        // Control qubit 1, target qubit 0 in a 2-qubit register: |01> -> |11>.
        let mut state = StateVector::from_basis_index(2, 0b01).unwrap();
        apply_block(&mut state, &[1, 0], &cnot).unwrap();
        assert_relative_eq!(state.probability(0b11), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_unitary_matrix_shrinks_norm() {
        let damp = vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.5, 0.0)];
        let mut state = StateVector::from_amplitudes(
            1,
            vec![c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0)],
        )
        .unwrap();
        apply_block(&mut state, &[0], &damp).unwrap();
        assert_relative_eq!(state.norm_sqr(), 0.5 + 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_path_matches_serial() {
        // 13 qubits crosses the parallel threshold.
        let n = 13;
        let dim = 1usize << n;
        let amps: Vec<Complex64> = (0..dim)
            .map(|i| c((i as f64).sin(), (i as f64).cos()))
            .collect();
        let mut big = StateVector::from_amplitudes(n, amps.clone()).unwrap();
        big.normalize().unwrap();
        let mut expected = big.clone();

        apply_block(&mut big, &[5], &h_matrix()).unwrap();

        // Serial reference on the same state via a manual loop.
        let bit = n - 1 - 5;
        let s = FRAC_1_SQRT_2;
        let exp_amps = expected.amplitudes_mut();
        for i in 0..dim {
            if (i >> bit) & 1 == 0 {
                let a = exp_amps[i];
                let b = exp_amps[i | (1 << bit)];
                exp_amps[i] = (a + b) * s;
                exp_amps[i | (1 << bit)] = (a - b) * s;
            }
        }
        for i in 0..dim {
            assert_relative_eq!(big.amplitudes()[i].re, expected.amplitudes()[i].re, epsilon = 1e-10);
            assert_relative_eq!(big.amplitudes()[i].im, expected.amplitudes()[i].im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rejects_out_of_range_target() {
        let mut state = StateVector::new(2).unwrap();
        let err = apply_block(&mut state, &[2], &x_matrix()).unwrap_err();
        assert!(matches!(err, StateError::InvalidQubitIndex { index: 2, .. }));
    }
}
