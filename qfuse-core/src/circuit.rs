//! Circuit container
//!
//! A circuit is a flat, time-ordered list of operations over a fixed
//! qubit count. Qubit ranges are checked as operations are appended, so a
//! constructed circuit is always internally consistent.

use crate::channel::Channel;
use crate::error::{CircuitError, Result};
use crate::gate::Gate;

/// A mid- or end-of-circuit computational-basis measurement
///
/// The outcome bits are recorded under `key` in application order, one
/// bit per listed qubit.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub qubits: Vec<usize>,
    pub key: String,
}

/// One time slot in a circuit
#[derive(Debug, Clone)]
pub enum Operation {
    Gate(Gate),
    Channel(Channel),
    Measure(Measurement),
}

impl Operation {
    /// Qubits this operation touches
    pub fn qubits(&self) -> &[usize] {
        match self {
            Operation::Gate(g) => g.qubits(),
            Operation::Channel(ch) => ch.qubits(),
            Operation::Measure(m) => &m.qubits,
        }
    }
}

/// An ordered operation list over `num_qubits` qubits
#[derive(Debug, Clone)]
pub struct Circuit {
    num_qubits: usize,
    ops: Vec<Operation>,
}

impl Circuit {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            ops: Vec::new(),
        }
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[inline]
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn add_gate(&mut self, gate: Gate) -> Result<&mut Self> {
        self.check_range(gate.qubits())?;
        self.ops.push(Operation::Gate(gate));
        Ok(self)
    }

    pub fn add_channel(&mut self, channel: Channel) -> Result<&mut Self> {
        self.check_range(channel.qubits())?;
        self.ops.push(Operation::Channel(channel));
        Ok(self)
    }

    /// Append a measurement of `qubits`, recorded under `key`
    pub fn add_measurement(&mut self, qubits: &[usize], key: impl Into<String>) -> Result<&mut Self> {
        if qubits.is_empty() {
            return Err(CircuitError::EmptyOperation(
                "measurement has no targets".into(),
            ));
        }
        for (i, &q) in qubits.iter().enumerate() {
            if qubits[..i].contains(&q) {
                return Err(CircuitError::DuplicateQubit(q));
            }
        }
        self.check_range(qubits)?;
        self.ops.push(Operation::Measure(Measurement {
            qubits: qubits.to_vec(),
            key: key.into(),
        }));
        Ok(self)
    }

    fn check_range(&self, qubits: &[usize]) -> Result<()> {
        for &q in qubits {
            if q >= self.num_qubits {
                return Err(CircuitError::InvalidQubit {
                    qubit: q,
                    num_qubits: self.num_qubits,
                });
            }
        }
        Ok(())
    }

    /// Whether any operation is a noise channel
    pub fn has_channels(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, Operation::Channel(_)))
    }

    /// Whether any operation is a measurement
    pub fn has_measurements(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, Operation::Measure(_)))
    }

    /// Whether every measurement sits after the last gate and channel
    ///
    /// When this holds, repeated sampling can reuse a single final state
    /// instead of re-simulating per repetition.
    pub fn measurements_are_terminal(&self) -> bool {
        let mut seen_measure = false;
        for op in &self.ops {
            match op {
                Operation::Measure(_) => seen_measure = true,
                _ if seen_measure => return false,
                _ => {}
            }
        }
        true
    }

    /// Distinct measurement keys in first-appearance order
    pub fn measurement_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for op in &self.ops {
            if let Operation::Measure(m) = op {
                if !keys.contains(&m.key.as_str()) {
                    keys.push(&m.key);
                }
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_gate_checks_range() {
        let mut circuit = Circuit::new(2);
        let err = circuit.add_gate(Gate::x(2)).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::InvalidQubit {
                qubit: 2,
                num_qubits: 2
            }
        ));
    }

    #[test]
    fn test_measurement_rejects_duplicates() {
        let mut circuit = Circuit::new(3);
        let err = circuit.add_measurement(&[0, 0], "m").unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateQubit(0)));
    }

    #[test]
    fn test_terminal_measurement_detection() {
        let mut circuit = Circuit::new(2);
        circuit.add_gate(Gate::h(0)).unwrap();
        circuit.add_measurement(&[0, 1], "m").unwrap();
        assert!(circuit.measurements_are_terminal());

        let mut interleaved = Circuit::new(2);
        interleaved.add_measurement(&[0], "a").unwrap();
        interleaved.add_gate(Gate::x(1)).unwrap();
        assert!(!interleaved.measurements_are_terminal());
    }

    #[test]
    fn test_measurement_keys_in_order() {
        let mut circuit = Circuit::new(3);
        circuit.add_measurement(&[0], "first").unwrap();
        circuit.add_measurement(&[1], "second").unwrap();
        circuit.add_measurement(&[2], "first").unwrap();
        assert_eq!(circuit.measurement_keys(), vec!["first", "second"]);
    }

    #[test]
    fn test_has_channels() {
        let mut circuit = Circuit::new(1);
        assert!(!circuit.has_channels());
        circuit
            .add_channel(Channel::bit_flip(0, 0.1).unwrap())
            .unwrap();
        assert!(circuit.has_channels());
    }
}
