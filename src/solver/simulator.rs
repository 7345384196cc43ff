//! Main simulator interface.

use std::fmt;

use crate::circuit::{Circuit, GateId, PinRef, Position, Wire, WireId};
use crate::error::{LogicSimError, Result};
use crate::gates::{Gate, GateKind};

use super::{MAX_NESTING_DEPTH, MAX_PASSES};

/// Configuration for the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Passes per step before the circuit is reported as oscillating.
    pub max_passes: usize,
    /// Deepest allowed custom gate nesting.
    pub max_nesting_depth: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_passes: MAX_PASSES,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pass ceiling.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the custom gate nesting limit.
    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }

    /// Reject settings the solver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(LogicSimError::InvalidSimulationParam {
                message: "max_passes must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of one [`Simulator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Passes run, including the final quiet one
    pub passes: usize,
    /// A pass completed with no change
    pub stable: bool,
    /// The pass ceiling was reached without settling
    pub oscillating: bool,
}

impl StepReport {
    fn settled(passes: usize) -> Self {
        Self {
            passes,
            stable: true,
            oscillating: false,
        }
    }

    fn unsettled(passes: usize) -> Self {
        Self {
            passes,
            stable: false,
            oscillating: true,
        }
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stable {
            write!(f, "stable after {} passes", self.passes)
        } else {
            write!(f, "oscillating after {} passes", self.passes)
        }
    }
}

/// The circuit simulator.
///
/// Owns every gate and wire of one circuit level. A custom gate owns its
/// own simulator with a separate id namespace.
#[derive(Debug, Default)]
pub struct Simulator {
    /// The circuit being simulated
    circuit: Circuit,
    config: SimulatorConfig,
    last_report: Option<StepReport>,
}

impl Simulator {
    /// Create an empty simulator with default configuration.
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    /// Create an empty simulator with custom configuration.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self {
            circuit: Circuit::new(),
            config,
            last_report: None,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Get a reference to the circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get a mutable reference to the circuit.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// Report from the most recent step.
    pub fn last_report(&self) -> Option<StepReport> {
        self.last_report
    }

    // ============ Graph mutation ============

    /// Add a gate at the origin.
    pub fn add_gate(&mut self, kind: GateKind) -> GateId {
        self.circuit.add_gate(kind)
    }

    /// Add a gate at a canvas position.
    pub fn add_gate_at(&mut self, kind: GateKind, position: Position) -> GateId {
        let id = self.circuit.add_gate(kind);
        self.circuit.move_gate(id, position);
        id
    }

    /// Remove a gate along with every wire touching it.
    pub fn remove_gate(&mut self, id: GateId) -> bool {
        match self.circuit.remove_gate(id) {
            Ok(wires) => {
                clilog::trace!("removed gate {} and {} wires", id, wires.len());
                true
            }
            Err(_) => false,
        }
    }

    /// Wire output pin `source` to input pin `destination`.
    pub fn create_wire(&mut self, source: PinRef, destination: PinRef) -> Result<WireId> {
        self.circuit.create_wire(source, destination).inspect_err(|e| {
            clilog::debug!("rejected wire {} -> {}: {}", source, destination, e);
        })
    }

    pub fn remove_wire(&mut self, id: WireId) -> bool {
        self.circuit.remove_wire(id).is_ok()
    }

    /// Move a gate to the front of the z-order. No effect on simulation
    /// results.
    pub fn bring_to_front(&mut self, id: GateId) -> bool {
        self.circuit.bring_to_front(id)
    }

    pub fn move_gate(&mut self, id: GateId, position: Position) -> bool {
        self.circuit.move_gate(id, position)
    }

    /// Drop all gates and wires and restart id numbering.
    pub fn clear(&mut self) {
        self.circuit.clear();
        self.last_report = None;
    }

    // ============ Lookup ============

    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.circuit.gate(id)
    }

    pub fn gate_mut(&mut self, id: GateId) -> Option<&mut Gate> {
        self.circuit.gate_mut(id)
    }

    pub fn find_gate_by_id(&self, id: GateId) -> Option<&Gate> {
        self.circuit.gate(id)
    }

    pub fn find_gate_by_label(&self, label: &str) -> Option<GateId> {
        self.circuit.find_gate_by_label(label)
    }

    pub fn find_wire_by_pins(&self, source: PinRef, destination: PinRef) -> Option<WireId> {
        self.circuit.find_wire_by_pins(source, destination)
    }

    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.circuit.gates()
    }

    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.circuit.wires()
    }

    // ============ Signals ============

    fn require_mut(&mut self, id: GateId) -> Result<&mut Gate> {
        self.circuit
            .gate_mut(id)
            .ok_or(LogicSimError::GateNotFound { gate: id })
    }

    fn require(&self, id: GateId) -> Result<&Gate> {
        self.circuit
            .gate(id)
            .ok_or(LogicSimError::GateNotFound { gate: id })
    }

    /// Set the value of an Input source gate.
    pub fn set_source(&mut self, id: GateId, value: bool) -> Result<bool> {
        self.require_mut(id)?.set_source_value(value)
    }

    /// Flip an Input source gate, returning the new value.
    pub fn toggle_source(&mut self, id: GateId) -> Result<bool> {
        let gate = self.require_mut(id)?;
        let value = !gate.source_value().unwrap_or(true);
        gate.set_source_value(value)?;
        Ok(value)
    }

    /// Set the buffered state of an unconnected input pin.
    pub fn set_input_state(&mut self, id: GateId, index: usize, state: bool) -> Result<bool> {
        self.require_mut(id)?.set_input_state(index, state)
    }

    pub fn output_state(&self, id: GateId, index: usize) -> Result<bool> {
        self.require(id)?.output_state(index)
    }

    /// Active flag of an Output sink gate.
    pub fn is_active(&self, id: GateId) -> Result<bool> {
        self.require(id)?
            .is_active()
            .ok_or(LogicSimError::WrongGateKind {
                gate: id,
                expected: "an output sink",
            })
    }

    // ============ Simulation ============

    /// Drive the circuit to a fixed point.
    ///
    /// Runs passes until one changes nothing, or until the configured
    /// ceiling is reached, in which case the report is `oscillating` and
    /// `passes` equals the ceiling. An empty circuit is stable after zero
    /// passes.
    pub fn step(&mut self) -> StepReport {
        let report = self.run_passes();
        self.last_report = Some(report);
        report
    }

    fn run_passes(&mut self) -> StepReport {
        if self.circuit.is_empty() {
            return StepReport::settled(0);
        }

        let max_passes = self.config.max_passes;
        for pass in 1..=max_passes {
            let wires_changed = self.circuit.update_wires();
            let gates_changed = self.circuit.update_gates();
            let dirty = self.circuit.any_dirty();
            clilog::trace!(
                "pass {}: wires_changed={} gates_changed={} dirty={}",
                pass,
                wires_changed,
                gates_changed,
                dirty
            );
            if !wires_changed && !gates_changed && !dirty {
                return StepReport::settled(pass);
            }
        }

        clilog::debug!("circuit did not settle within {} passes", max_passes);
        StepReport::unsettled(max_passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::validate_circuit;
    use crate::gates::{CustomGateDefinition, GateLibrary};

    const PAIRS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

    fn wire(sim: &mut Simulator, from: GateId, out: usize, to: GateId, input: usize) -> WireId {
        sim.create_wire(PinRef::output(from, out), PinRef::input(to, input))
            .unwrap()
    }

    /// Source -> `kind` -> sink, with both sources driving the gate.
    fn binary_circuit(kind: GateKind) -> (Simulator, GateId, GateId, GateId) {
        let mut sim = Simulator::new();
        let a = sim.add_gate(GateKind::input(false));
        let b = sim.add_gate(GateKind::input(false));
        let gate = sim.add_gate(kind);
        let sink = sim.add_gate(GateKind::output());
        wire(&mut sim, a, 0, gate, 0);
        wire(&mut sim, b, 0, gate, 1);
        wire(&mut sim, gate, 0, sink, 0);
        (sim, a, b, sink)
    }

    /// Source, `depth` NOT gates and a sink, added and wired in `order`.
    ///
    /// Node 0 is the source, nodes 1..=depth are NOT gates and node
    /// depth + 1 is the sink.
    fn not_chain(depth: usize, order: &[usize]) -> (Simulator, GateId, GateId) {
        assert_eq!(order.len(), depth + 2);
        let mut sim = Simulator::new();
        let mut ids = vec![GateId(usize::MAX); depth + 2];
        for &node in order {
            ids[node] = if node == 0 {
                sim.add_gate(GateKind::input(false))
            } else if node == depth + 1 {
                sim.add_gate(GateKind::output())
            } else {
                sim.add_gate(GateKind::Not)
            };
        }
        for &node in order.iter().filter(|&&n| n > 0) {
            wire(&mut sim, ids[node - 1], 0, ids[node], 0);
        }
        (sim, ids[0], ids[depth + 1])
    }

    /// Deterministic permutation of 0..n (n must not be a multiple of 5).
    fn shuffled(n: usize) -> Vec<usize> {
        assert_ne!(n % 5, 0);
        (0..n).map(|i| (i * 5 + 3) % n).collect()
    }

    #[test]
    fn test_empty_circuit_is_stable() {
        let mut sim = Simulator::new();
        assert_eq!(
            sim.step(),
            StepReport {
                passes: 0,
                stable: true,
                oscillating: false
            }
        );
    }

    #[test]
    fn test_truth_tables() {
        let cases: [(fn() -> GateKind, fn(bool, bool) -> bool, &str); 3] = [
            (|| GateKind::And, |a, b| a && b, "AND"),
            (|| GateKind::Or, |a, b| a || b, "OR"),
            (|| GateKind::Xor, |a, b| a != b, "XOR"),
        ];
        for (kind, expected, name) in cases {
            let (mut sim, a, b, sink) = binary_circuit(kind());
            for (in_a, in_b) in PAIRS {
                sim.set_source(a, in_a).unwrap();
                sim.set_source(b, in_b).unwrap();
                assert!(sim.step().stable);
                assert_eq!(
                    sim.is_active(sink).unwrap(),
                    expected(in_a, in_b),
                    "{in_a} {name} {in_b}"
                );
            }
        }
    }

    #[test]
    fn test_not_truth_table() {
        let (mut sim, source, sink) = not_chain(1, &[0, 1, 2]);
        for value in [false, true] {
            sim.set_source(source, value).unwrap();
            sim.step();
            assert_eq!(sim.is_active(sink).unwrap(), !value);
        }
    }

    #[test]
    fn test_depth_parity() {
        for depth in [1, 2, 5, 8, 13, 20] {
            let order: Vec<usize> = (0..depth + 2).collect();
            let (mut sim, source, sink) = not_chain(depth, &order);
            let report = sim.step();
            assert!(report.stable, "depth {depth}: {report}");
            assert!(report.passes >= 1 && report.passes <= MAX_PASSES);
            assert_eq!(sim.is_active(sink).unwrap(), depth % 2 == 0, "depth {depth}");

            sim.set_source(source, true).unwrap();
            assert!(sim.step().stable);
            assert_eq!(sim.is_active(sink).unwrap(), depth % 2 == 1, "depth {depth}");
        }
    }

    #[test]
    fn test_insertion_order_does_not_change_result() {
        let depth = 11;
        let forward: Vec<usize> = (0..depth + 2).collect();
        let reverse: Vec<usize> = forward.iter().rev().copied().collect();
        let mixed = shuffled(depth + 2);

        for value in [false, true] {
            let mut results = Vec::new();
            for order in [&forward, &reverse, &mixed] {
                let (mut sim, source, sink) = not_chain(depth, order);
                sim.set_source(source, value).unwrap();
                assert!(sim.step().stable);
                results.push(sim.is_active(sink).unwrap());
            }
            assert!(results.iter().all(|&r| r == results[0]), "{results:?}");
            assert_eq!(results[0], !value);
        }
    }

    #[test]
    fn test_fan_out_de_morgan() {
        let mut sim = Simulator::new();
        let input = sim.add_gate(GateKind::input(true));
        let not_a = sim.add_gate(GateKind::Not);
        let not_b = sim.add_gate(GateKind::Not);
        let or = sim.add_gate(GateKind::Or);
        let sink = sim.add_gate(GateKind::output());
        wire(&mut sim, input, 0, not_a, 0);
        wire(&mut sim, input, 0, not_b, 0);
        wire(&mut sim, not_a, 0, or, 0);
        wire(&mut sim, not_b, 0, or, 1);
        wire(&mut sim, or, 0, sink, 0);

        assert!(sim.step().stable);
        assert!(!sim.is_active(sink).unwrap());

        sim.set_source(input, false).unwrap();
        assert!(sim.step().stable);
        assert!(sim.is_active(sink).unwrap());
    }

    #[test]
    fn test_self_loop_oscillates_every_step() {
        let mut sim = Simulator::new();
        let not = sim.add_gate(GateKind::Not);
        wire(&mut sim, not, 0, not, 0);
        for _ in 0..3 {
            let report = sim.step();
            assert!(!report.stable);
            assert!(report.oscillating);
            assert_eq!(report.passes, MAX_PASSES);
        }
        assert_eq!(sim.last_report().map(|r| r.passes), Some(MAX_PASSES));
    }

    #[test]
    fn test_pass_ceiling_is_configurable() {
        let mut sim = Simulator::with_config(SimulatorConfig::new().with_max_passes(10));
        let not = sim.add_gate(GateKind::Not);
        wire(&mut sim, not, 0, not, 0);
        assert_eq!(sim.step().passes, 10);
        assert!(SimulatorConfig::new().with_max_passes(0).validate().is_err());
    }

    #[test]
    fn test_stable_circuit_is_idempotent() {
        let (mut sim, a, b, sink) = binary_circuit(GateKind::And);
        sim.set_source(a, true).unwrap();
        sim.set_source(b, true).unwrap();
        assert!(sim.step().stable);
        assert!(sim.is_active(sink).unwrap());

        let before: Vec<Vec<bool>> = sim.gates().map(Gate::output_states).collect();
        let report = sim.step();
        assert_eq!(report, StepReport::settled(1));
        let after: Vec<Vec<bool>> = sim.gates().map(Gate::output_states).collect();
        assert_eq!(before, after);
        assert!(sim.is_active(sink).unwrap());
    }

    #[test]
    fn test_remove_gate_leaves_no_dangling_wires() {
        let mut sim = Simulator::new();
        let input = sim.add_gate(GateKind::input(false));
        let hub = sim.add_gate(GateKind::Not);
        let sinks: Vec<GateId> = (0..3).map(|_| sim.add_gate(GateKind::output())).collect();
        let mut attached = vec![wire(&mut sim, input, 0, hub, 0)];
        for &sink in &sinks {
            attached.push(wire(&mut sim, hub, 0, sink, 0));
        }
        let other = sim.add_gate(GateKind::Not);
        let kept = wire(&mut sim, input, 0, other, 0);
        sim.step();
        assert!(sinks.iter().all(|&s| sim.is_active(s).unwrap()));

        assert!(sim.remove_gate(hub));
        assert!(!sim.remove_gate(hub));
        assert_eq!(sim.wires().count(), 1);
        assert!(sim.wires().all(|w| !w.touches(hub)));
        for gate in sim.gates() {
            for w in gate.wires() {
                assert!(!attached.contains(w), "{} still lists {}", gate.id(), w);
            }
        }
        assert_eq!(sim.gate(input).unwrap().wires(), &[kept]);
        validate_circuit(sim.circuit()).unwrap();

        // Orphaned sinks fall back to their buffered (low) input
        assert!(sim.step().stable);
        for &sink in &sinks {
            assert!(!sim.is_active(sink).unwrap());
        }
    }

    #[test]
    fn test_remove_wire_reevaluates_destination() {
        let (mut sim, a, _, sink) = binary_circuit(GateKind::Or);
        sim.set_source(a, true).unwrap();
        sim.step();
        assert!(sim.is_active(sink).unwrap());

        let or = sim.gate(sink).unwrap().inputs()[0].source().unwrap().gate;
        let w = sim
            .find_wire_by_pins(PinRef::output(a, 0), PinRef::input(or, 0))
            .unwrap();
        assert!(sim.remove_wire(w));
        assert!(!sim.remove_wire(w));
        sim.step();
        assert!(!sim.is_active(sink).unwrap());
    }

    #[test]
    fn test_create_wire_failure_leaves_graph_untouched() {
        let (mut sim, a, b, sink) = binary_circuit(GateKind::And);
        let before = sim.wires().count();
        assert!(sim
            .create_wire(PinRef::output(b, 0), PinRef::input(sink, 0))
            .is_err());
        assert!(sim
            .create_wire(PinRef::input(sink, 0), PinRef::output(a, 0))
            .is_err());
        assert_eq!(sim.wires().count(), before);
    }

    #[test]
    fn test_toggle_and_unconnected_inputs() {
        let mut sim = Simulator::new();
        let source = sim.add_gate(GateKind::input(false));
        assert!(sim.toggle_source(source).unwrap());
        assert!(!sim.toggle_source(source).unwrap());

        let and = sim.add_gate(GateKind::And);
        sim.set_input_state(and, 0, true).unwrap();
        sim.set_input_state(and, 1, true).unwrap();
        sim.step();
        assert!(sim.output_state(and, 0).unwrap());
        assert!(sim.is_active(and).is_err());
        assert!(sim.set_source(and, true).is_err());
    }

    #[test]
    fn test_bring_to_front_keeps_results() {
        let (mut sim, a, b, sink) = binary_circuit(GateKind::Xor);
        sim.set_source(a, true).unwrap();
        assert!(sim.bring_to_front(a));
        assert!(sim.bring_to_front(b));
        sim.step();
        assert!(sim.is_active(sink).unwrap());
        assert_eq!(sim.circuit().gate_ids().last(), Some(&b));
    }

    #[test]
    fn test_clear_resets() {
        let (mut sim, _, _, _) = binary_circuit(GateKind::And);
        sim.step();
        sim.clear();
        assert!(sim.last_report().is_none());
        assert_eq!(sim.step().passes, 0);
        assert_eq!(sim.add_gate(GateKind::Not), GateId(0));
    }

    #[test]
    fn test_custom_gate_in_host_circuit() {
        let def = CustomGateDefinition::new("NAND", 2, 1)
            .gate(0, "AND")
            .gate(1, "NOT")
            .wire(0, 0, 1, 0)
            .map_input(0, 0, 0)
            .map_input(1, 0, 1)
            .map_output(0, 1, 0);
        let library: GateLibrary = vec![def].into_iter().collect();
        let kind = GateKind::from_name("NAND", &library, &SimulatorConfig::default()).unwrap();
        let (mut sim, a, b, sink) = binary_circuit(kind);

        for (in_a, in_b) in PAIRS {
            sim.set_source(a, in_a).unwrap();
            sim.set_source(b, in_b).unwrap();
            assert!(sim.step().stable);
            assert_eq!(sim.is_active(sink).unwrap(), !(in_a && in_b), "{in_a} NAND {in_b}");
        }

        assert!(matches!(
            GateKind::from_name("NOR", &library, &SimulatorConfig::default()),
            Err(LogicSimError::UnknownDefinition { .. })
        ));
    }

    #[test]
    fn test_invalid_custom_gate_does_not_stop_host() {
        let def = CustomGateDefinition::new("EMPTY", 1, 1);
        let library: GateLibrary = vec![def].into_iter().collect();
        let kind = GateKind::from_name("EMPTY", &library, &SimulatorConfig::default()).unwrap();

        let mut sim = Simulator::new();
        let source = sim.add_gate(GateKind::input(true));
        let custom = sim.add_gate(kind);
        let sink = sim.add_gate(GateKind::output());
        wire(&mut sim, source, 0, custom, 0);
        wire(&mut sim, custom, 0, sink, 0);

        assert!(!sim.gate(custom).unwrap().as_custom().unwrap().is_valid());
        assert!(sim.step().stable);
        assert!(!sim.is_active(sink).unwrap());
    }
}
