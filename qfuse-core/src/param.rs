//! Parameterized circuits and symbol binding
//!
//! A [`ParamCircuit`] is a template whose rotation exponents and angles
//! may be named symbols instead of numbers. Resolving against a
//! [`Binding`] produces an ordinary [`Circuit`]; the template itself is
//! never mutated, so one template serves a whole parameter sweep.

use crate::circuit::{Circuit, Operation};
use crate::error::{CircuitError, Result};
use crate::gate::Gate;
use ahash::AHashMap;

/// Symbol name to value map for one sweep point
pub type Binding = AHashMap<String, f64>;

/// A scalar that is either fixed or a named symbol
#[derive(Debug, Clone)]
pub enum Param {
    Value(f64),
    Symbol(String),
}

impl Param {
    pub fn symbol(name: impl Into<String>) -> Self {
        Param::Symbol(name.into())
    }

    /// Resolve to a concrete value
    ///
    /// # Errors
    /// `UnboundSymbol` if the binding lacks this symbol.
    pub fn resolve(&self, binding: &Binding) -> Result<f64> {
        match self {
            Param::Value(v) => Ok(*v),
            Param::Symbol(name) => binding
                .get(name)
                .copied()
                .ok_or_else(|| CircuitError::UnboundSymbol(name.clone())),
        }
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Value(v)
    }
}

/// One slot of a parameterized circuit
#[derive(Debug, Clone)]
pub enum ParamOp {
    /// An operation with no free parameters
    Fixed(Operation),
    XPow { qubit: usize, exponent: Param },
    YPow { qubit: usize, exponent: Param },
    ZPow { qubit: usize, exponent: Param },
    Rx { qubit: usize, angle: Param },
    Ry { qubit: usize, angle: Param },
    Rz { qubit: usize, angle: Param },
}

/// Circuit template with free symbolic parameters
#[derive(Debug, Clone)]
pub struct ParamCircuit {
    num_qubits: usize,
    ops: Vec<ParamOp>,
}

impl ParamCircuit {
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

    pub fn push(&mut self, op: ParamOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Instantiate the template with concrete parameter values
    pub fn resolve(&self, binding: &Binding) -> Result<Circuit> {
        let mut circuit = Circuit::new(self.num_qubits);
        for op in &self.ops {
            match op {
                ParamOp::Fixed(Operation::Gate(g)) => {
                    circuit.add_gate(g.clone())?;
                }
                ParamOp::Fixed(Operation::Channel(ch)) => {
                    circuit.add_channel(ch.clone())?;
                }
                ParamOp::Fixed(Operation::Measure(m)) => {
                    circuit.add_measurement(&m.qubits, m.key.clone())?;
                }
                ParamOp::XPow { qubit, exponent } => {
                    circuit.add_gate(Gate::x_pow(*qubit, exponent.resolve(binding)?))?;
                }
                ParamOp::YPow { qubit, exponent } => {
                    circuit.add_gate(Gate::y_pow(*qubit, exponent.resolve(binding)?))?;
                }
                ParamOp::ZPow { qubit, exponent } => {
                    circuit.add_gate(Gate::z_pow(*qubit, exponent.resolve(binding)?))?;
                }
                ParamOp::Rx { qubit, angle } => {
                    circuit.add_gate(Gate::rx(*qubit, angle.resolve(binding)?))?;
                }
                ParamOp::Ry { qubit, angle } => {
                    circuit.add_gate(Gate::ry(*qubit, angle.resolve(binding)?))?;
                }
                ParamOp::Rz { qubit, angle } => {
                    circuit.add_gate(Gate::rz(*qubit, angle.resolve(binding)?))?;
                }
            }
        }
        Ok(circuit)
    }
}
