//! Trajectory sampling over noisy and measured circuits

use approx::assert_relative_eq;
use qfuse_core::{Channel, Circuit, Gate};
use qfuse_sim::{Simulator, SimulatorConfig};

fn simulator_with_seed(seed: u64) -> Simulator {
    Simulator::new(SimulatorConfig::new().with_seed(seed)).unwrap()
}

#[test]
fn test_bit_flip_frequency() {
    let mut circuit = Circuit::new(1);
    circuit.add_channel(Channel::bit_flip(0, 0.2).unwrap()).unwrap();
    circuit.add_measurement(&[0], "m").unwrap();

    let result = simulator_with_seed(7).run(&circuit, 20_000).unwrap();
    assert_relative_eq!(result.frequency("m", &[1]), 0.2, epsilon = 0.02);
}

#[test]
fn test_depolarizing_on_plus_state() {
    // X leaves |+> alone, so only Y and Z branches flip the X basis.
    // Measuring in the computational basis after a closing H: flip
    // probability is 2p/3.
    let mut circuit = Circuit::new(1);
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit
        .add_channel(Channel::depolarizing(0, 0.3).unwrap())
        .unwrap();
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit.add_measurement(&[0], "m").unwrap();

    let result = simulator_with_seed(13).run(&circuit, 20_000).unwrap();
    assert_relative_eq!(result.frequency("m", &[1]), 0.2, epsilon = 0.02);
}

#[test]
fn test_amplitude_damping_from_excited_state() {
    let mut circuit = Circuit::new(1);
    circuit.add_gate(Gate::x(0)).unwrap();
    circuit
        .add_channel(Channel::amplitude_damping(0, 0.35).unwrap())
        .unwrap();
    circuit.add_measurement(&[0], "m").unwrap();

    let result = simulator_with_seed(19).run(&circuit, 20_000).unwrap();
    assert_relative_eq!(result.frequency("m", &[0]), 0.35, epsilon = 0.02);
}

#[test]
fn test_seeded_runs_are_identical() {
    let mut circuit = Circuit::new(2);
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit
        .add_channel(Channel::phase_flip(0, 0.4).unwrap())
        .unwrap();
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit.add_measurement(&[0, 1], "m").unwrap();

    let first = simulator_with_seed(42).run(&circuit, 200).unwrap();
    let second = simulator_with_seed(42).run(&circuit, 200).unwrap();
    assert_eq!(first.measurements("m"), second.measurements("m"));

    let other = simulator_with_seed(43).run(&circuit, 200).unwrap();
    assert_ne!(first.measurements("m"), other.measurements("m"));
}

#[test]
fn test_unseeded_runs_differ() {
    // Without a seed each simulator draws its own master seed from
    // entropy, so two instances must not replay the same trajectories.
    let mut circuit = Circuit::new(4);
    for q in 0..4 {
        circuit.add_gate(Gate::h(q)).unwrap();
    }
    circuit.add_measurement(&[0, 1, 2, 3], "m").unwrap();

    let first = Simulator::new(SimulatorConfig::new())
        .unwrap()
        .run(&circuit, 64)
        .unwrap();
    let second = Simulator::new(SimulatorConfig::new())
        .unwrap()
        .run(&circuit, 64)
        .unwrap();
    assert_ne!(first.measurements("m"), second.measurements("m"));
}

#[test]
fn test_terminal_measurements_are_correlated() {
    // Bell pair measured as two separate keys: the bits must agree in
    // every repetition because both come from one sampled basis state.
    let mut circuit = Circuit::new(2);
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit.add_gate(Gate::cnot(0, 1).unwrap()).unwrap();
    circuit.add_measurement(&[0], "a").unwrap();
    circuit.add_measurement(&[1], "b").unwrap();

    let result = simulator_with_seed(5).run(&circuit, 500).unwrap();
    let a = result.measurements("a").unwrap();
    let b = result.measurements("b").unwrap();
    assert_eq!(a.len(), 500);
    for (bits_a, bits_b) in a.iter().zip(b) {
        assert_eq!(bits_a, bits_b);
    }
}

#[test]
fn test_intermediate_measurement_collapses() {
    // Measuring |+> twice under one key: the second outcome must repeat
    // the first, giving only 00 and 11 records.
    let mut circuit = Circuit::new(1);
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit.add_measurement(&[0], "m").unwrap();
    circuit.add_measurement(&[0], "m").unwrap();

    let result = simulator_with_seed(31).run(&circuit, 2_000).unwrap();
    let rows = result.measurements("m").unwrap();
    let mut zeros = 0;
    for row in rows {
        assert_eq!(row.len(), 2);
        assert_eq!(row[0], row[1]);
        if row[0] == 0 {
            zeros += 1;
        }
    }
    assert_relative_eq!(zeros as f64 / rows.len() as f64, 0.5, epsilon = 0.05);
}

#[test]
fn test_gate_after_measurement_forces_trajectories() {
    // A non-terminal measurement runs the trajectory path; the H after
    // the collapse restores a 50/50 second measurement.
    let mut circuit = Circuit::new(1);
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit.add_measurement(&[0], "first").unwrap();
    circuit.add_gate(Gate::h(0)).unwrap();
    circuit.add_measurement(&[0], "second").unwrap();

    let result = simulator_with_seed(77).run(&circuit, 10_000).unwrap();
    assert_relative_eq!(result.frequency("second", &[1]), 0.5, epsilon = 0.03);
}

#[test]
fn test_noise_between_gates_blocks_fusion_but_not_results() {
    // A zero-probability channel must leave statistics identical to the
    // noiseless circuit even though it splits the fusion groups.
    let mut noisy = Circuit::new(1);
    noisy.add_gate(Gate::h(0)).unwrap();
    noisy.add_channel(Channel::bit_flip(0, 0.0).unwrap()).unwrap();
    noisy.add_gate(Gate::h(0)).unwrap();
    noisy.add_measurement(&[0], "m").unwrap();

    let result = simulator_with_seed(3).run(&noisy, 2_000).unwrap();
    assert_relative_eq!(result.frequency("m", &[0]), 1.0, epsilon = 1e-12);
}
