//! Hybrid cut-based amplitude engine
//!
//! Splits the qubit register into two halves and simulates each half as
//! its own small state vector. Every gate crossing the cut is expanded
//! into a sum of product terms; one choice of term per cross gate is a
//! path, and the amplitude of a basis state is the sum over all paths of
//! the product of the two half amplitudes.
//!
//! The path count is the product of the per-gate term counts, so the
//! engine only pays off when few gates cross the cut. Within a path the
//! half states are not normalized; the cross-gate factors are not
//! unitary, and only the path sum is physical.
//!
//! This engine answers amplitude queries only. Channels and measurements
//! have no path-sum realization here and are rejected.

use crate::error::{Result, SimulatorError};
use num_complex::Complex64;
use qfuse_core::{Circuit, Operation};
use qfuse_state::{apply_block, StateVector};
use rayon::prelude::*;
use smallvec::SmallVec;

/// Partition and scheduling knobs for the hybrid engine
#[derive(Debug, Clone)]
pub struct HybridConfig {
    /// Global qubit indices assigned to the first half
    pub part_a: Vec<usize>,
    /// Declared cut width; must equal `part_a.len()`
    pub cut_width: usize,
    /// Threads over the path sum; 1 runs serially
    pub path_threads: usize,
    /// Threads installed around each path's half-state kernels; 1 leaves
    /// them on the calling thread
    pub block_threads: usize,
}

impl HybridConfig {
    pub fn new(part_a: Vec<usize>) -> Self {
        let cut_width = part_a.len();
        Self {
            part_a,
            cut_width,
            path_threads: 1,
            block_threads: 1,
        }
    }

    pub fn with_cut_width(mut self, cut_width: usize) -> Self {
        self.cut_width = cut_width;
        self
    }

    pub fn with_path_threads(mut self, path_threads: usize) -> Self {
        self.path_threads = path_threads;
        self
    }

    pub fn with_block_threads(mut self, block_threads: usize) -> Self {
        self.block_threads = block_threads;
        self
    }

    fn validate(&self, num_qubits: usize) -> Result<()> {
        if self.part_a.is_empty() || self.part_a.len() >= num_qubits {
            return Err(SimulatorError::InvalidConfig(format!(
                "part_a must be a proper nonempty subset, got {} of {} qubits",
                self.part_a.len(),
                num_qubits
            )));
        }
        for (i, &q) in self.part_a.iter().enumerate() {
            if q >= num_qubits {
                return Err(SimulatorError::InvalidConfig(format!(
                    "part_a qubit {} outside circuit of {} qubits",
                    q, num_qubits
                )));
            }
            if self.part_a[..i].contains(&q) {
                return Err(SimulatorError::InvalidConfig(format!(
                    "part_a lists qubit {} twice",
                    q
                )));
            }
        }
        if self.cut_width != self.part_a.len() {
            return Err(SimulatorError::InvalidConfig(format!(
                "cut_width {} does not match part_a size {}",
                self.cut_width,
                self.part_a.len()
            )));
        }
        if self.path_threads == 0 || self.block_threads == 0 {
            return Err(SimulatorError::InvalidConfig(
                "thread counts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// One product term of a cross-cut gate
#[derive(Debug, Clone)]
struct Branch {
    /// Elementary operator on the first target's half
    u_matrix: Vec<Complex64>,
    /// Sub-block on the second target's half
    v_matrix: Vec<Complex64>,
}

#[derive(Debug, Clone)]
struct CrossGate {
    u_side: Side,
    u_local: usize,
    v_local: usize,
    branches: Vec<Branch>,
}

#[derive(Debug, Clone)]
enum ScheduleEntry {
    Local {
        side: Side,
        targets: SmallVec<[usize; 2]>,
        matrix: Vec<Complex64>,
    },
    Cross(usize),
}

struct Schedule {
    entries: Vec<ScheduleEntry>,
    cross_gates: Vec<CrossGate>,
    a_qubits: Vec<usize>,
    b_qubits: Vec<usize>,
}

/// Cut-based amplitude engine over a fixed partition
#[derive(Debug, Clone)]
pub struct HybridSimulator {
    config: HybridConfig,
}

impl HybridSimulator {
    pub fn new(config: HybridConfig) -> Self {
        Self { config }
    }

    /// Amplitudes of the given basis states after running `circuit` from
    /// the all-zeros state
    pub fn compute_amplitudes(
        &self,
        circuit: &Circuit,
        bitstrings: &[u64],
    ) -> Result<Vec<Complex64>> {
        let n = circuit.num_qubits();
        if n >= 64 {
            return Err(SimulatorError::State(
                qfuse_state::StateError::TooManyQubits(n),
            ));
        }
        self.config.validate(n)?;
        let dim = 1u64 << n;
        for &b in bitstrings {
            if b >= dim {
                return Err(SimulatorError::InvalidInitialState(format!(
                    "bitstring {:#b} outside a {}-qubit register",
                    b, n
                )));
            }
        }

        let schedule = self.build_schedule(circuit)?;
        let num_paths: usize = schedule
            .cross_gates
            .iter()
            .map(|cg| cg.branches.len())
            .product();
        log::debug!(
            "hybrid run: {} cross gates, {} paths",
            schedule.cross_gates.len(),
            num_paths
        );

        let block_pool = if self.config.block_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.block_threads)
                    .build()
                    .map_err(|e| SimulatorError::InvalidConfig(e.to_string()))?,
            )
        } else {
            None
        };

        let run_path = |path: usize| -> Result<Vec<Complex64>> {
            let (state_a, state_b) = self.simulate_path(&schedule, path, block_pool.as_ref())?;
            Ok(bitstrings
                .iter()
                .map(|&b| {
                    let (idx_a, idx_b) = split_bitstring(b, circuit.num_qubits(), &schedule);
                    state_a.amplitude(idx_a) * state_b.amplitude(idx_b)
                })
                .collect())
        };

        let zero = vec![Complex64::new(0.0, 0.0); bitstrings.len()];
        let sum_terms = |mut acc: Vec<Complex64>, term: Vec<Complex64>| {
            for (a, t) in acc.iter_mut().zip(&term) {
                *a += t;
            }
            acc
        };

        if self.config.path_threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.path_threads)
                .build()
                .map_err(|e| SimulatorError::InvalidConfig(e.to_string()))?;
            pool.install(|| {
                (0..num_paths)
                    .into_par_iter()
                    .map(run_path)
                    .try_reduce(|| zero.clone(), |a, b| Ok(sum_terms(a, b)))
            })
        } else {
            let mut acc = zero;
            for path in 0..num_paths {
                acc = sum_terms(acc, run_path(path)?);
            }
            Ok(acc)
        }
    }

    fn build_schedule(&self, circuit: &Circuit) -> Result<Schedule> {
        let n = circuit.num_qubits();
        let mut a_qubits: Vec<usize> = self.config.part_a.clone();
        a_qubits.sort_unstable();
        let b_qubits: Vec<usize> = (0..n).filter(|q| !a_qubits.contains(q)).collect();

        let locate = |q: usize| -> (Side, usize) {
            match a_qubits.iter().position(|&a| a == q) {
                Some(local) => (Side::A, local),
                None => (Side::B, b_qubits.iter().position(|&b| b == q).unwrap()),
            }
        };

        let mut entries = Vec::new();
        let mut cross_gates = Vec::new();
        for op in circuit.ops() {
            let gate = match op {
                Operation::Gate(g) => g,
                Operation::Channel(_) => {
                    return Err(SimulatorError::UnsupportedOperation(
                        "hybrid engine cannot realize noise channels".into(),
                    ))
                }
                Operation::Measure(_) => {
                    return Err(SimulatorError::UnsupportedOperation(
                        "hybrid engine cannot realize measurements".into(),
                    ))
                }
            };
            let sides: SmallVec<[(Side, usize); 2]> =
                gate.qubits().iter().map(|&q| locate(q)).collect();
            let all_a = sides.iter().all(|(s, _)| *s == Side::A);
            let all_b = sides.iter().all(|(s, _)| *s == Side::B);
            if all_a || all_b {
                entries.push(ScheduleEntry::Local {
                    side: if all_a { Side::A } else { Side::B },
                    targets: sides.iter().map(|(_, local)| *local).collect(),
                    matrix: gate.matrix().to_vec(),
                });
                continue;
            }
            if gate.num_qubits() != 2 {
                return Err(SimulatorError::UnsupportedOperation(format!(
                    "{}-qubit gate crosses the cut; only 2-qubit cross gates are supported",
                    gate.num_qubits()
                )));
            }

            // Expand over the first target: M = sum |ru><su| (x) M(ru,su).
            let m = gate.matrix();
            let mut branches = Vec::new();
            for ru in 0..2usize {
                for su in 0..2usize {
                    let v_matrix: Vec<Complex64> = (0..2)
                        .flat_map(|rv| {
                            (0..2).map(move |sv| m[((ru << 1) | rv) * 4 + ((su << 1) | sv)])
                        })
                        .collect();
                    if v_matrix.iter().all(|c| c.norm_sqr() == 0.0) {
                        continue;
                    }
                    let mut u_matrix = vec![Complex64::new(0.0, 0.0); 4];
                    u_matrix[ru * 2 + su] = Complex64::new(1.0, 0.0);
                    branches.push(Branch { u_matrix, v_matrix });
                }
            }
            entries.push(ScheduleEntry::Cross(cross_gates.len()));
            cross_gates.push(CrossGate {
                u_side: sides[0].0,
                u_local: sides[0].1,
                v_local: sides[1].1,
                branches,
            });
        }

        Ok(Schedule {
            entries,
            cross_gates,
            a_qubits,
            b_qubits,
        })
    }

    /// Run both halves for one choice of cross-gate branches
    fn simulate_path(
        &self,
        schedule: &Schedule,
        path: usize,
        block_pool: Option<&rayon::ThreadPool>,
    ) -> Result<(StateVector, StateVector)> {
        match block_pool {
            Some(pool) => pool.install(|| self.run_lanes(schedule, path)),
            None => self.run_lanes(schedule, path),
        }
    }

    fn run_lanes(&self, schedule: &Schedule, path: usize) -> Result<(StateVector, StateVector)> {
        let mut state_a = StateVector::new(schedule.a_qubits.len())?;
        let mut state_b = StateVector::new(schedule.b_qubits.len())?;

        // Mixed-radix decode of the path index into per-gate branch picks.
        let mut digits: SmallVec<[usize; 8]> = SmallVec::new();
        let mut rest = path;
        for cg in &schedule.cross_gates {
            digits.push(rest % cg.branches.len());
            rest /= cg.branches.len();
        }

        for entry in &schedule.entries {
            match entry {
                ScheduleEntry::Local {
                    side,
                    targets,
                    matrix,
                } => {
                    let state = match side {
                        Side::A => &mut state_a,
                        Side::B => &mut state_b,
                    };
                    apply_block(state, targets, matrix)?;
                }
                ScheduleEntry::Cross(i) => {
                    let cg = &schedule.cross_gates[*i];
                    let branch = &cg.branches[digits[*i]];
                    let (u_state, v_state) = match cg.u_side {
                        Side::A => (&mut state_a, &mut state_b),
                        Side::B => (&mut state_b, &mut state_a),
                    };
                    apply_block(u_state, &[cg.u_local], &branch.u_matrix)?;
                    apply_block(v_state, &[cg.v_local], &branch.v_matrix)?;
                }
            }
        }
        Ok((state_a, state_b))
    }
}

/// Split a global basis index into per-half local indices
fn split_bitstring(bitstring: u64, num_qubits: usize, schedule: &Schedule) -> (u64, u64) {
    let bit = |q: usize| (bitstring >> (num_qubits - 1 - q)) & 1;
    let fold = |qubits: &[usize]| {
        qubits
            .iter()
            .fold(0u64, |acc, &q| (acc << 1) | bit(q))
    };
    (fold(&schedule.a_qubits), fold(&schedule.b_qubits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qfuse_core::Gate;

    #[test]
    fn test_validate_rejects_bad_cut_width() {
        let config = HybridConfig::new(vec![0]).with_cut_width(2);
        let err = HybridSimulator::new(config)
            .compute_amplitudes(&Circuit::new(2), &[0])
            .unwrap_err();
        assert!(matches!(err, SimulatorError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_full_partition() {
        let config = HybridConfig::new(vec![0, 1]);
        let err = HybridSimulator::new(config)
            .compute_amplitudes(&Circuit::new(2), &[0])
            .unwrap_err();
        assert!(matches!(err, SimulatorError::InvalidConfig(_)));
    }

    #[test]
    fn test_channel_rejected() {
        let mut circuit = Circuit::new(2);
        circuit
            .add_channel(qfuse_core::Channel::bit_flip(0, 0.1).unwrap())
            .unwrap();
        let err = HybridSimulator::new(HybridConfig::new(vec![0]))
            .compute_amplitudes(&circuit, &[0])
            .unwrap_err();
        assert!(matches!(err, SimulatorError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_controlled_cross_gate_has_two_branches() {
        let mut circuit = Circuit::new(2);
        circuit.add_gate(Gate::cnot(0, 1).unwrap()).unwrap();
        let sim = HybridSimulator::new(HybridConfig::new(vec![0]));
        let schedule = sim.build_schedule(&circuit).unwrap();
        assert_eq!(schedule.cross_gates.len(), 1);
        assert_eq!(schedule.cross_gates[0].branches.len(), 2);
    }

    #[test]
    fn test_bell_state_amplitudes() {
        let mut circuit = Circuit::new(2);
        circuit.add_gate(Gate::h(0)).unwrap();
        circuit.add_gate(Gate::cnot(0, 1).unwrap()).unwrap();
        let sim = HybridSimulator::new(HybridConfig::new(vec![0]));
        let amps = sim
            .compute_amplitudes(&circuit, &[0b00, 0b01, 0b10, 0b11])
            .unwrap();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(amps[0].re, s, epsilon = 1e-12);
        assert_relative_eq!(amps[1].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(amps[2].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(amps[3].re, s, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_gate_with_control_on_second_half() {
        // CNOT with the control in part B exercises the u-side-B path.
        let mut circuit = Circuit::new(2);
        circuit.add_gate(Gate::x(1)).unwrap();
        circuit.add_gate(Gate::cnot(1, 0).unwrap()).unwrap();
        let sim = HybridSimulator::new(HybridConfig::new(vec![0]));
        let amps = sim
            .compute_amplitudes(&circuit, &[0b00, 0b01, 0b10, 0b11])
            .unwrap();
        // |00> -> |01> -> |11>
        assert_relative_eq!(amps[3].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(amps[0].norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_path_threads_match_serial() {
        let mut circuit = Circuit::new(3);
        circuit.add_gate(Gate::h(0)).unwrap();
        circuit.add_gate(Gate::cnot(0, 1).unwrap()).unwrap();
        circuit.add_gate(Gate::cnot(1, 2).unwrap()).unwrap();
        circuit.add_gate(Gate::t(2)).unwrap();
        let bitstrings: Vec<u64> = (0..8).collect();

        let serial = HybridSimulator::new(HybridConfig::new(vec![0, 1]))
            .compute_amplitudes(&circuit, &bitstrings)
            .unwrap();
        let parallel = HybridSimulator::new(
            HybridConfig::new(vec![0, 1]).with_path_threads(2),
        )
        .compute_amplitudes(&circuit, &bitstrings)
        .unwrap();
        for (a, b) in serial.iter().zip(&parallel) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }
}
