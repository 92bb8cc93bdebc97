//! Gate fusion
//!
//! Collapses runs of small gates into larger dense blocks so the state
//! vector is swept fewer times. Fusion is exact: a fused block is the
//! literal matrix product of its member gates, so the final state is
//! bit-for-bit equivalent to the unfused circuit up to floating-point
//! association order.
//!
//! Planning and building are split. A [`FusionPlan`] captures only the
//! grouping topology, which depends on qubit connectivity and not on
//! matrix entries. A parameter sweep therefore plans once and rebuilds
//! the block matrices per binding.

use crate::error::{Result, SimulatorError};
use ahash::AHashMap;
use qfuse_core::matrix;
use qfuse_core::{Channel, Circuit, Gate, Measurement, Operation};

/// One slot of a fusion plan, referring to circuit operations by index
#[derive(Debug, Clone)]
pub enum PlanSlot {
    /// Gates fused into one block; `qubits` is the sorted union of their
    /// targets and `op_indices` is ascending
    Group {
        op_indices: Vec<usize>,
        qubits: Vec<usize>,
    },
    /// A channel or measurement, forwarded unfused
    Passthrough(usize),
}

/// Grouping topology of a circuit under a fusion ceiling
#[derive(Debug, Clone)]
pub struct FusionPlan {
    num_qubits: usize,
    slots: Vec<PlanSlot>,
}

/// An executable slot with concrete matrices
#[derive(Debug, Clone)]
pub enum Slot {
    Block(Gate),
    Channel(Channel),
    Measure(Measurement),
}

#[derive(Debug)]
struct OpenGroup {
    op_indices: Vec<usize>,
    qubits: Vec<usize>,
}

impl FusionPlan {
    /// Greedily group the circuit's gates under the given ceiling
    ///
    /// The scan keeps at most one open group per qubit. A gate joins the
    /// open groups it touches when the merged qubit union stays within
    /// `max_fused_qubits`; otherwise those groups are sealed first.
    /// Channels and measurements seal every group on their qubits, acting
    /// as fusion barriers.
    pub fn plan(circuit: &Circuit, max_fused_qubits: usize) -> Self {
        let mut slots: Vec<PlanSlot> = Vec::new();
        let mut groups: Vec<Option<OpenGroup>> = Vec::new();
        let mut owner: AHashMap<usize, usize> = AHashMap::new();

        fn seal(
            groups: &mut [Option<OpenGroup>],
            owner: &mut AHashMap<usize, usize>,
            slots: &mut Vec<PlanSlot>,
            id: usize,
        ) {
            if let Some(group) = groups[id].take() {
                for q in &group.qubits {
                    owner.remove(q);
                }
                slots.push(PlanSlot::Group {
                    op_indices: group.op_indices,
                    qubits: group.qubits,
                });
            }
        }

        for (op_index, op) in circuit.ops().iter().enumerate() {
            match op {
                Operation::Gate(gate) => {
                    let mut touched: Vec<usize> = Vec::new();
                    for q in gate.qubits() {
                        if let Some(&id) = owner.get(q) {
                            if !touched.contains(&id) {
                                touched.push(id);
                            }
                        }
                    }
                    touched.sort_unstable();

                    let mut union: Vec<usize> = gate.qubits().to_vec();
                    for &id in &touched {
                        for q in &groups[id].as_ref().unwrap().qubits {
                            if !union.contains(q) {
                                union.push(*q);
                            }
                        }
                    }
                    union.sort_unstable();

                    if union.len() <= max_fused_qubits {
                        // Merge the touched groups and absorb the gate.
                        let mut op_indices: Vec<usize> = Vec::new();
                        for &id in &touched {
                            let group = groups[id].take().unwrap();
                            for q in &group.qubits {
                                owner.remove(q);
                            }
                            op_indices.extend(group.op_indices);
                        }
                        op_indices.sort_unstable();
                        op_indices.push(op_index);
                        let id = groups.len();
                        for &q in &union {
                            owner.insert(q, id);
                        }
                        groups.push(Some(OpenGroup {
                            op_indices,
                            qubits: union,
                        }));
                    } else {
                        for &id in &touched {
                            seal(&mut groups, &mut owner, &mut slots, id);
                        }
                        if gate.num_qubits() <= max_fused_qubits {
                            let id = groups.len();
                            let mut qubits = gate.qubits().to_vec();
                            qubits.sort_unstable();
                            for &q in &qubits {
                                owner.insert(q, id);
                            }
                            groups.push(Some(OpenGroup {
                                op_indices: vec![op_index],
                                qubits,
                            }));
                        } else {
                            // Too wide to ever merge; emit directly.
                            let mut qubits = gate.qubits().to_vec();
                            qubits.sort_unstable();
                            slots.push(PlanSlot::Group {
                                op_indices: vec![op_index],
                                qubits,
                            });
                        }
                    }
                }
                Operation::Channel(_) | Operation::Measure(_) => {
                    let mut touched: Vec<usize> = Vec::new();
                    for q in op.qubits() {
                        if let Some(&id) = owner.get(q) {
                            if !touched.contains(&id) {
                                touched.push(id);
                            }
                        }
                    }
                    touched.sort_unstable();
                    for &id in &touched {
                        seal(&mut groups, &mut owner, &mut slots, id);
                    }
                    slots.push(PlanSlot::Passthrough(op_index));
                }
            }
        }

        // Seal what remains, in opening order.
        for id in 0..groups.len() {
            seal(&mut groups, &mut owner, &mut slots, id);
        }

        log::debug!(
            "fusion plan: {} ops -> {} slots",
            circuit.len(),
            slots.len()
        );

        Self {
            num_qubits: circuit.num_qubits(),
            slots,
        }
    }

    #[inline]
    pub fn slots(&self) -> &[PlanSlot] {
        &self.slots
    }

    /// Materialize block matrices against a concrete circuit
    ///
    /// The circuit must have the topology this plan was made from; sweeps
    /// rely on that to rebuild per binding without replanning.
    pub fn build(&self, circuit: &Circuit) -> Result<Vec<Slot>> {
        if circuit.num_qubits() != self.num_qubits {
            return Err(SimulatorError::InvalidConfig(format!(
                "plan is for {} qubits, circuit has {}",
                self.num_qubits,
                circuit.num_qubits()
            )));
        }
        let mut built = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            match slot {
                PlanSlot::Group { op_indices, qubits } => {
                    let dim = matrix::dim_for(qubits.len());
                    let mut acc = matrix::identity(dim);
                    for &op_index in op_indices {
                        let gate = match &circuit.ops()[op_index] {
                            Operation::Gate(g) => g,
                            other => {
                                return Err(SimulatorError::UnsupportedOperation(format!(
                                    "plan group references non-gate operation {:?}",
                                    other.qubits()
                                )))
                            }
                        };
                        let embedded = matrix::embed(gate.matrix(), gate.qubits(), qubits)?;
                        acc = matrix::multiply(&embedded, &acc, dim);
                    }
                    built.push(Slot::Block(Gate::new(qubits, acc)?));
                }
                PlanSlot::Passthrough(op_index) => match &circuit.ops()[*op_index] {
                    Operation::Channel(ch) => built.push(Slot::Channel(ch.clone())),
                    Operation::Measure(m) => built.push(Slot::Measure(m.clone())),
                    Operation::Gate(_) => {
                        return Err(SimulatorError::UnsupportedOperation(
                            "plan passthrough references a gate".into(),
                        ))
                    }
                },
            }
        }
        Ok(built)
    }
}

/// Plan and build in one step
pub fn fuse(circuit: &Circuit, max_fused_qubits: usize) -> Result<Vec<Slot>> {
    FusionPlan::plan(circuit, max_fused_qubits).build(circuit)
}
