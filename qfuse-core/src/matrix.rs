//! Small dense-matrix helpers shared by gates, channels and the fusion pass
//!
//! Matrices are stored row-major as `Vec<Complex64>` with side length
//! `2^k` for a k-qubit operator. Nothing here is sized for large linear
//! algebra; the largest matrix the engine ever builds is 64 x 64
//! (a fused block at the 6-qubit ceiling).

use crate::error::{CircuitError, Result};
use num_complex::Complex64;

/// Side length of a k-qubit operator matrix
#[inline]
pub fn dim_for(num_qubits: usize) -> usize {
    1 << num_qubits
}

/// Identity matrix of the given side length
pub fn identity(dim: usize) -> Vec<Complex64> {
    let mut m = vec![Complex64::new(0.0, 0.0); dim * dim];
    for i in 0..dim {
        m[i * dim + i] = Complex64::new(1.0, 0.0);
    }
    m
}

/// Row-major matrix product `a * b` for square matrices of side `dim`
pub fn multiply(a: &[Complex64], b: &[Complex64], dim: usize) -> Vec<Complex64> {
    debug_assert_eq!(a.len(), dim * dim);
    debug_assert_eq!(b.len(), dim * dim);
    let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
    for row in 0..dim {
        for inner in 0..dim {
            let lhs = a[row * dim + inner];
            if lhs.norm_sqr() == 0.0 {
                continue;
            }
            for col in 0..dim {
                out[row * dim + col] += lhs * b[inner * dim + col];
            }
        }
    }
    out
}

/// Conjugate transpose of a square matrix
pub fn adjoint(m: &[Complex64], dim: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
    for row in 0..dim {
        for col in 0..dim {
            out[col * dim + row] = m[row * dim + col].conj();
        }
    }
    out
}

/// Check whether a square matrix is the identity within `epsilon`
pub fn is_identity(m: &[Complex64], dim: usize, epsilon: f64) -> bool {
    for row in 0..dim {
        for col in 0..dim {
            let expected = if row == col { 1.0 } else { 0.0 };
            if (m[row * dim + col] - expected).norm() > epsilon {
                return false;
            }
        }
    }
    true
}

/// Embed a gate matrix into the index space of a larger qubit set
///
/// `gate_qubits` is the gate's own ordered target list; `block_qubits` is
/// the sorted superset the result acts on. In both index spaces the first
/// listed qubit occupies the most significant bit. Entries are zero
/// wherever the bits outside the gate's targets differ between row and
/// column, and the gate matrix elsewhere.
///
/// # Errors
/// `InvalidQubit` if a gate target is not in `block_qubits`.
pub fn embed(
    matrix: &[Complex64],
    gate_qubits: &[usize],
    block_qubits: &[usize],
) -> Result<Vec<Complex64>> {
    let m = block_qubits.len();
    let k = gate_qubits.len();
    let dim = dim_for(m);
    let gate_dim = dim_for(k);
    debug_assert_eq!(matrix.len(), gate_dim * gate_dim);

    // Bit position inside the block index for each gate target, and a mask
    // of the block-index bits the gate does not touch.
    let mut gate_bits = Vec::with_capacity(k);
    for q in gate_qubits {
        let j = block_qubits
            .iter()
            .position(|b| b == q)
            .ok_or(CircuitError::InvalidQubit {
                qubit: *q,
                num_qubits: m,
            })?;
        gate_bits.push(m - 1 - j);
    }
    let mut outside_mask = dim - 1;
    for &bit in &gate_bits {
        outside_mask &= !(1 << bit);
    }

    let sub_index = |full: usize| -> usize {
        let mut sub = 0;
        for (pos, &bit) in gate_bits.iter().enumerate() {
            sub |= ((full >> bit) & 1) << (k - 1 - pos);
        }
        sub
    };

    let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
    for row in 0..dim {
        let row_sub = sub_index(row);
        for col in 0..dim {
            if (row & outside_mask) != (col & outside_mask) {
                continue;
            }
            out[row * dim + col] = matrix[row_sub * gate_dim + sub_index(col)];
        }
    }
    Ok(out)
}
