//! Slot executor
//!
//! Runs a fused slot sequence against one state vector. Gates are dense
//! block applications; channels are realized as single trajectories,
//! picking one branch per encounter; measurements collapse the state and
//! append their outcome bits to the record.

use crate::error::Result;
use crate::fusion::Slot;
use ahash::AHashMap;
use qfuse_core::{Channel, ChannelKind};
use qfuse_state::{apply_block, measure_subset, StateVector};
use rand::Rng;

/// Outcome bits per measurement key for a single trajectory
pub type Record = AHashMap<String, Vec<u8>>;

/// Execute a slot sequence, mutating `state` in place
pub fn run_slots<R: Rng>(
    slots: &[Slot],
    state: &mut StateVector,
    rng: &mut R,
    record: &mut Record,
) -> Result<()> {
    for slot in slots {
        match slot {
            Slot::Block(gate) => {
                apply_block(state, gate.qubits(), gate.matrix())?;
            }
            Slot::Channel(channel) => {
                realize_channel(channel, state, rng)?;
            }
            Slot::Measure(m) => {
                let bits = measure_subset(state, &m.qubits, rng)?;
                record.entry(m.key.clone()).or_default().extend(bits);
            }
        }
    }
    Ok(())
}

/// Pick and apply one branch of a channel
///
/// Mixture branches are chosen by their declared probabilities. Kraus
/// branches are chosen by their induced probabilities: each operator is
/// applied to a copy and the squared norm of the unnormalized result is
/// the weight, which sums to one over a complete set.
fn realize_channel<R: Rng>(channel: &Channel, state: &mut StateVector, rng: &mut R) -> Result<()> {
    match channel.kind() {
        ChannelKind::Mixture(components) => {
            let r: f64 = rng.gen();
            let mut acc = 0.0;
            let mut chosen = components.len() - 1;
            for (i, comp) in components.iter().enumerate() {
                acc += comp.probability;
                if r < acc {
                    chosen = i;
                    break;
                }
            }
            apply_block(state, channel.qubits(), &components[chosen].matrix)?;
        }
        ChannelKind::Kraus(operators) => {
            let r: f64 = rng.gen();
            let mut acc = 0.0;
            let last = operators.len() - 1;
            for (i, op) in operators.iter().enumerate() {
                let mut candidate = state.clone();
                apply_block(&mut candidate, channel.qubits(), op)?;
                acc += candidate.norm_sqr();
                if r < acc || i == last {
                    candidate.normalize()?;
                    *state = candidate;
                    break;
                }
            }
        }
    }
    Ok(())
}
