//! Top-level simulator
//!
//! Ties fusion, the dense kernel, trajectory sampling and parameter
//! sweeps together behind one configured entry point. Deterministic
//! queries (`simulate`, `compute_amplitudes`) demand a pure gate circuit;
//! anything stochastic goes through `run`, which realizes channels and
//! measurements per repetition.

use crate::config::SimulatorConfig;
use crate::engine::{run_slots, Record};
use crate::error::{Result, SimulatorError};
use crate::fusion::{fuse, FusionPlan, Slot};
use crate::result::RunResult;
use num_complex::Complex64;
use qfuse_core::{Binding, Circuit, ParamCircuit};
use qfuse_state::{sample_indices, StateError, StateVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Per-shot seed spacing, the 64-bit golden ratio
const SHOT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Starting state for a simulation
#[derive(Debug, Clone)]
pub enum InitialState {
    /// A computational basis state
    Basis(u64),
    /// An arbitrary normalized amplitude vector
    Vector(Vec<Complex64>),
}

impl InitialState {
    fn materialize(&self, num_qubits: usize) -> Result<StateVector> {
        if num_qubits >= 64 {
            return Err(StateError::TooManyQubits(num_qubits).into());
        }
        match self {
            InitialState::Basis(index) => {
                let dim = 1u64 << num_qubits;
                if *index >= dim {
                    return Err(SimulatorError::InvalidInitialState(format!(
                        "basis index {} outside a {}-qubit register",
                        index, num_qubits
                    )));
                }
                Ok(StateVector::from_basis_index(num_qubits, *index)?)
            }
            InitialState::Vector(amps) => {
                let state = StateVector::from_amplitudes(num_qubits, amps.clone())?;
                if !state.is_normalized(1e-6) {
                    return Err(SimulatorError::InvalidInitialState(
                        "amplitude vector is not normalized".into(),
                    ));
                }
                Ok(state)
            }
        }
    }
}

/// Configured dense-statevector simulator
pub struct Simulator {
    config: SimulatorConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        let pool = if config.num_threads > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.num_threads)
                    .build()
                    .map_err(|e| SimulatorError::InvalidConfig(e.to_string()))?,
            )
        } else {
            None
        };
        Ok(Self { config, pool })
    }

    #[inline]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn install<T: Send>(&self, f: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    fn master_seed(&self) -> u64 {
        match self.config.seed {
            Some(seed) => seed,
            None => StdRng::from_entropy().gen(),
        }
    }

    /// Final state of a pure gate circuit from the all-zeros state
    pub fn simulate(&self, circuit: &Circuit) -> Result<StateVector> {
        self.simulate_from(circuit, &InitialState::Basis(0))
    }

    /// Final state of a pure gate circuit from a chosen initial state
    ///
    /// The circuit must be deterministic: channels and measurements are
    /// rejected here and belong in [`Simulator::run`].
    pub fn simulate_from(&self, circuit: &Circuit, initial: &InitialState) -> Result<StateVector> {
        if circuit.has_channels() {
            return Err(SimulatorError::UnsupportedOperation(
                "circuit contains noise channels; use run".into(),
            ));
        }
        if circuit.has_measurements() {
            return Err(SimulatorError::UnsupportedOperation(
                "circuit contains measurements; use run".into(),
            ));
        }
        let slots = fuse(circuit, self.config.max_fused_qubits)?;
        if self.config.verbosity > 0 {
            log::info!(
                "simulating {} qubits, {} fused slots",
                circuit.num_qubits(),
                slots.len()
            );
        }
        let mut state = initial.materialize(circuit.num_qubits())?;
        self.install(|| apply_blocks(&slots, &mut state))?;
        Ok(state)
    }

    /// Amplitudes of selected basis states after a pure gate circuit
    pub fn compute_amplitudes(&self, circuit: &Circuit, bitstrings: &[u64]) -> Result<Vec<Complex64>> {
        if circuit.num_qubits() >= 64 {
            return Err(StateError::TooManyQubits(circuit.num_qubits()).into());
        }
        let dim = 1u64 << circuit.num_qubits();
        for &b in bitstrings {
            if b >= dim {
                return Err(SimulatorError::InvalidInitialState(format!(
                    "bitstring {:#b} outside a {}-qubit register",
                    b,
                    circuit.num_qubits()
                )));
            }
        }
        let state = self.simulate(circuit)?;
        Ok(bitstrings.iter().map(|&b| state.amplitude(b)).collect())
    }

    /// Repeated stochastic execution with measurement records
    ///
    /// Each repetition is an independent trajectory with its own RNG
    /// stream derived from the master seed, so results are reproducible
    /// under a fixed seed regardless of thread scheduling. Circuits whose
    /// measurements are all terminal and which carry no channels are
    /// simulated once and sampled `repetitions` times.
    pub fn run(&self, circuit: &Circuit, repetitions: usize) -> Result<RunResult> {
        let slots = fuse(circuit, self.config.max_fused_qubits)?;
        let master = self.master_seed();

        let records: Vec<Record> = if !circuit.has_channels() && circuit.measurements_are_terminal()
        {
            self.run_sampled(circuit, &slots, repetitions, master)?
        } else {
            self.run_trajectories(circuit, &slots, repetitions, master)?
        };

        let mut result = RunResult {
            repetitions,
            ..RunResult::default()
        };
        for key in circuit.measurement_keys() {
            result.records.insert(String::from(key), Vec::new());
        }
        for record in records {
            for (key, bits) in record {
                result.records.entry(key).or_default().push(bits);
            }
        }
        Ok(result)
    }

    /// Fast path: one final state, many samples
    fn run_sampled(
        &self,
        circuit: &Circuit,
        slots: &[Slot],
        repetitions: usize,
        master: u64,
    ) -> Result<Vec<Record>> {
        let mut state = StateVector::new(circuit.num_qubits())?;
        let mut measures = Vec::new();
        self.install(|| -> Result<()> {
            for slot in slots {
                match slot {
                    Slot::Block(gate) => {
                        qfuse_state::apply_block(&mut state, gate.qubits(), gate.matrix())?;
                    }
                    Slot::Measure(m) => measures.push(m.clone()),
                    Slot::Channel(_) => unreachable!("checked by caller"),
                }
            }
            Ok(())
        })?;

        let mut rng = StdRng::seed_from_u64(master);
        let indices = sample_indices(&state, repetitions, &mut rng);
        let n = circuit.num_qubits();
        Ok(indices
            .into_iter()
            .map(|index| {
                let mut record = Record::default();
                for m in &measures {
                    let bits: Vec<u8> = m
                        .qubits
                        .iter()
                        .map(|&q| ((index >> (n - 1 - q)) & 1) as u8)
                        .collect();
                    record.entry(m.key.clone()).or_default().extend(bits);
                }
                record
            })
            .collect())
    }

    /// General path: one full trajectory per repetition
    fn run_trajectories(
        &self,
        circuit: &Circuit,
        slots: &[Slot],
        repetitions: usize,
        master: u64,
    ) -> Result<Vec<Record>> {
        let num_qubits = circuit.num_qubits();
        self.install(|| {
            (0..repetitions)
                .into_par_iter()
                .map(|shot| {
                    let seed = master.wrapping_add((shot as u64).wrapping_mul(SHOT_SEED_STRIDE));
                    let mut rng = StdRng::seed_from_u64(seed);
                    let mut state = StateVector::new(num_qubits)?;
                    let mut record = Record::default();
                    run_slots(slots, &mut state, &mut rng, &mut record)?;
                    Ok(record)
                })
                .collect::<Result<Vec<Record>>>()
        })
    }

    /// Resolve and simulate a template across many parameter bindings
    ///
    /// The fusion plan is computed once from the first binding and reused
    /// for the rest; only the block matrices are rebuilt per point.
    pub fn simulate_sweep(
        &self,
        template: &ParamCircuit,
        bindings: &[Binding],
    ) -> Result<Vec<StateVector>> {
        let Some(first) = bindings.first() else {
            return Ok(Vec::new());
        };
        let first_circuit = template.resolve(first)?;
        if first_circuit.has_channels() || first_circuit.has_measurements() {
            return Err(SimulatorError::UnsupportedOperation(
                "sweep circuits must be pure gate circuits".into(),
            ));
        }
        let plan = FusionPlan::plan(&first_circuit, self.config.max_fused_qubits);

        let mut states = Vec::with_capacity(bindings.len());
        for (i, binding) in bindings.iter().enumerate() {
            let circuit = if i == 0 {
                first_circuit.clone()
            } else {
                template.resolve(binding)?
            };
            let slots = plan.build(&circuit)?;
            let mut state = StateVector::new(circuit.num_qubits())?;
            self.install(|| apply_blocks(&slots, &mut state))?;
            states.push(state);
        }
        Ok(states)
    }
}

fn apply_blocks(slots: &[Slot], state: &mut StateVector) -> Result<()> {
    for slot in slots {
        match slot {
            Slot::Block(gate) => {
                qfuse_state::apply_block(state, gate.qubits(), gate.matrix())?;
            }
            Slot::Channel(_) | Slot::Measure(_) => {
                return Err(SimulatorError::UnsupportedOperation(
                    "deterministic path hit a stochastic slot".into(),
                ))
            }
        }
    }
    Ok(())
}
