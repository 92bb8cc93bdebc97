//! Noise channels
//!
//! A channel is either a probabilistic mixture of unitaries or a general
//! Kraus-operator set. Both forms are validated at construction so the
//! trajectory sampler can assume well-formed input: mixture probabilities
//! must sum to one and Kraus sets must satisfy the completeness relation.

use crate::error::{CircuitError, Result};
use crate::gate::MAX_BLOCK_QUBITS;
use crate::matrix;
use num_complex::Complex64;
use smallvec::SmallVec;

const PROBABILITY_TOLERANCE: f64 = 1e-8;
const COMPLETENESS_TOLERANCE: f64 = 1e-8;

/// One branch of a unitary mixture
#[derive(Debug, Clone)]
pub struct MixtureComponent {
    pub probability: f64,
    pub matrix: Vec<Complex64>,
}

/// The two channel realizations the trajectory sampler understands
#[derive(Debug, Clone)]
pub enum ChannelKind {
    /// Unitaries applied with explicit classical probabilities
    Mixture(Vec<MixtureComponent>),
    /// General Kraus operators; selection probabilities are state dependent
    Kraus(Vec<Vec<Complex64>>),
}

/// A noise channel acting on an ordered set of target qubits
#[derive(Debug, Clone)]
pub struct Channel {
    qubits: SmallVec<[usize; 2]>,
    kind: ChannelKind,
}

impl Channel {
    /// Build a mixture channel
    ///
    /// # Errors
    /// - `InvalidProbability` if any probability is outside `[0, 1]` or the
    ///   sum deviates from 1 by more than the tolerance
    /// - `DimensionMismatch` if a component matrix has the wrong length
    pub fn mixture(qubits: &[usize], components: Vec<MixtureComponent>) -> Result<Self> {
        let dim = Self::validated_dim(qubits)?;
        if components.is_empty() {
            return Err(CircuitError::EmptyOperation(
                "mixture channel has no components".into(),
            ));
        }
        let mut total = 0.0;
        for comp in &components {
            if !(0.0..=1.0 + PROBABILITY_TOLERANCE).contains(&comp.probability) {
                return Err(CircuitError::InvalidProbability {
                    value: comp.probability,
                    reason: "mixture probability outside [0, 1]".into(),
                });
            }
            if comp.matrix.len() != dim * dim {
                return Err(CircuitError::DimensionMismatch {
                    expected: dim * dim,
                    actual: comp.matrix.len(),
                });
            }
            total += comp.probability;
        }
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(CircuitError::InvalidProbability {
                value: total,
                reason: "mixture probabilities must sum to 1".into(),
            });
        }
        Ok(Self {
            qubits: SmallVec::from_slice(qubits),
            kind: ChannelKind::Mixture(components),
        })
    }

    /// Build a Kraus channel
    ///
    /// # Errors
    /// - `DimensionMismatch` if an operator has the wrong length
    /// - `IncompleteKraus` if `sum(K^dag K)` deviates from the identity
    pub fn kraus(qubits: &[usize], operators: Vec<Vec<Complex64>>) -> Result<Self> {
        let dim = Self::validated_dim(qubits)?;
        if operators.is_empty() {
            return Err(CircuitError::EmptyOperation(
                "Kraus channel has no operators".into(),
            ));
        }
        let mut sum = vec![Complex64::new(0.0, 0.0); dim * dim];
        for op in &operators {
            if op.len() != dim * dim {
                return Err(CircuitError::DimensionMismatch {
                    expected: dim * dim,
                    actual: op.len(),
                });
            }
            let product = matrix::multiply(&matrix::adjoint(op, dim), op, dim);
            for (acc, term) in sum.iter_mut().zip(&product) {
                *acc += term;
            }
        }
        let deviation = sum
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let expected = if i / dim == i % dim { 1.0 } else { 0.0 };
                (entry - expected).norm()
            })
            .fold(0.0, f64::max);
        if deviation > COMPLETENESS_TOLERANCE {
            return Err(CircuitError::IncompleteKraus { deviation });
        }
        Ok(Self {
            qubits: SmallVec::from_slice(qubits),
            kind: ChannelKind::Kraus(operators),
        })
    }

    fn validated_dim(qubits: &[usize]) -> Result<usize> {
        if qubits.is_empty() {
            return Err(CircuitError::EmptyOperation("channel has no targets".into()));
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
        Ok(matrix::dim_for(qubits.len()))
    }

    #[inline]
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    #[inline]
    pub fn kind(&self) -> &ChannelKind {
        &self.kind
    }
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

// Standard single-qubit channels.
impl Channel {
    /// Bit flip: X with probability `p`, identity otherwise
    pub fn bit_flip(qubit: usize, p: f64) -> Result<Self> {
        Self::mixture(
            &[qubit],
            vec![
                MixtureComponent {
                    probability: 1.0 - p,
                    matrix: matrix::identity(2),
                },
                MixtureComponent {
                    probability: p,
                    matrix: vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
                },
            ],
        )
    }

    /// Phase flip: Z with probability `p`, identity otherwise
    pub fn phase_flip(qubit: usize, p: f64) -> Result<Self> {
        Self::mixture(
            &[qubit],
            vec![
                MixtureComponent {
                    probability: 1.0 - p,
                    matrix: matrix::identity(2),
                },
                MixtureComponent {
                    probability: p,
                    matrix: vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)],
                },
            ],
        )
    }

    /// Depolarizing: each Pauli with probability `p / 3`
    pub fn depolarizing(qubit: usize, p: f64) -> Result<Self> {
        let third = p / 3.0;
        Self::mixture(
            &[qubit],
            vec![
                MixtureComponent {
                    probability: 1.0 - p,
                    matrix: matrix::identity(2),
                },
                MixtureComponent {
                    probability: third,
                    matrix: vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
                },
                MixtureComponent {
                    probability: third,
                    matrix: vec![c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0)],
                },
                MixtureComponent {
                    probability: third,
                    matrix: vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)],
                },
            ],
        )
    }

    /// Amplitude damping with decay probability `gamma`
    pub fn amplitude_damping(qubit: usize, gamma: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(CircuitError::InvalidProbability {
                value: gamma,
                reason: "damping rate outside [0, 1]".into(),
            });
        }
        let k0 = vec![
            c(1.0, 0.0),
            c(0.0, 0.0),
            c(0.0, 0.0),
            c((1.0 - gamma).sqrt(), 0.0),
        ];
        let k1 = vec![
            c(0.0, 0.0),
            c(gamma.sqrt(), 0.0),
            c(0.0, 0.0),
            c(0.0, 0.0),
        ];
        Self::kraus(&[qubit], vec![k0, k1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixture_rejects_bad_sum() {
        let err = Channel::mixture(
            &[0],
            vec![MixtureComponent {
                probability: 0.5,
                matrix: matrix::identity(2),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidProbability { .. }));
    }

    #[test]
    fn test_mixture_rejects_negative_probability() {
        let err = Channel::mixture(
            &[0],
            vec![
                MixtureComponent {
                    probability: -0.1,
                    matrix: matrix::identity(2),
                },
                MixtureComponent {
                    probability: 1.1,
                    matrix: matrix::identity(2),
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidProbability { .. }));
    }

    #[test]
    fn test_kraus_completeness_enforced() {
        // A lone damping operator is not a complete channel.
        let k0 = vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.5, 0.0)];
        let err = Channel::kraus(&[0], vec![k0]).unwrap_err();
        assert!(matches!(err, CircuitError::IncompleteKraus { .. }));
    }

    #[test]
    fn test_amplitude_damping_is_complete() {
        let ch = Channel::amplitude_damping(0, 0.3).unwrap();
        assert!(matches!(ch.kind(), ChannelKind::Kraus(ops) if ops.len() == 2));
    }

    #[test]
    fn test_depolarizing_components() {
        let ch = Channel::depolarizing(0, 0.3).unwrap();
        match ch.kind() {
            ChannelKind::Mixture(comps) => {
                assert_eq!(comps.len(), 4);
                let total: f64 = comps.iter().map(|c| c.probability).sum();
                assert!((total - 1.0).abs() < 1e-12);
            }
            _ => panic!("expected mixture"),
        }
    }

    #[test]
    fn test_channel_rejects_duplicate_qubits() {
        let err = Channel::bit_flip(0, 0.1)
            .and_then(|_| {
                Channel::mixture(
                    &[1, 1],
                    vec![MixtureComponent {
                        probability: 1.0,
                        matrix: matrix::identity(4),
                    }],
                )
            })
            .unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateQubit(1)));
    }
}
