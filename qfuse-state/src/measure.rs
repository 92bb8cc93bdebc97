//! Sampling and measurement collapse
//!
//! Both entry points draw from the Born distribution by inverse-CDF
//! lookup over the cumulative probabilities. Interval boundaries are
//! lower-inclusive, so a random draw landing exactly on a boundary
//! selects the higher index; ties in probability resolve in index order.

use crate::error::{Result, StateError};
use crate::state_vector::StateVector;
use num_complex::Complex64;
use rand::Rng;

/// Draw `count` full-register basis indices from the state
///
/// The state is read-only here; sampling never collapses.
pub fn sample_indices<R: Rng>(state: &StateVector, count: usize, rng: &mut R) -> Vec<u64> {
    let dim = state.dim();
    let mut cumulative = Vec::with_capacity(dim);
    let mut total = 0.0;
    for amp in state.amplitudes() {
        total += amp.norm_sqr();
        cumulative.push(total);
    }

    (0..count)
        .map(|_| {
            let r: f64 = rng.gen::<f64>() * total;
            let idx = cumulative.partition_point(|&c| c <= r);
            idx.min(dim - 1) as u64
        })
        .collect()
}

/// Measure a subset of qubits, collapsing the state
///
/// Returns one bit per qubit in the given order. The state is projected
/// onto the sampled outcome and renormalized.
pub fn measure_subset<R: Rng>(
    state: &mut StateVector,
    qubits: &[usize],
    rng: &mut R,
) -> Result<Vec<u8>> {
    let n = state.num_qubits();
    for &q in qubits {
        if q >= n {
            return Err(StateError::InvalidQubitIndex {
                index: q,
                num_qubits: n,
            });
        }
    }
    let k = qubits.len();
    let sub_dim = 1usize << k;

    // Marginal distribution over the measured qubits. The first listed
    // qubit is the most significant bit of the outcome index.
    let bit_positions: Vec<usize> = qubits.iter().map(|&q| n - 1 - q).collect();
    let outcome_of = |index: usize| -> usize {
        let mut outcome = 0usize;
        for (j, &pos) in bit_positions.iter().enumerate() {
            outcome |= ((index >> pos) & 1) << (k - 1 - j);
        }
        outcome
    };

    let mut marginal = vec![0.0f64; sub_dim];
    for (index, amp) in state.amplitudes().iter().enumerate() {
        marginal[outcome_of(index)] += amp.norm_sqr();
    }

    let mut cumulative = marginal;
    let mut total = 0.0;
    for entry in &mut cumulative {
        total += *entry;
        *entry = total;
    }
    let r: f64 = rng.gen::<f64>() * total;
    let outcome = cumulative.partition_point(|&c| c <= r).min(sub_dim - 1);

    // Project and renormalize.
    for (index, amp) in state.amplitudes_mut().iter_mut().enumerate() {
        let mut keep = true;
        for (j, &pos) in bit_positions.iter().enumerate() {
            if (index >> pos) & 1 != (outcome >> (k - 1 - j)) & 1 {
                keep = false;
                break;
            }
        }
        if !keep {
            *amp = Complex64::new(0.0, 0.0);
        }
    }
    state.normalize()?;

    Ok((0..k)
        .map(|j| ((outcome >> (k - 1 - j)) & 1) as u8)
        .collect())
}
