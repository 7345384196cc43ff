//! Gate and wire arena for one circuit level.

use super::pin::Pin;
use super::types::{GateId, PinDirection, PinRef, Position, WireId};
use super::wire::Wire;
use crate::error::{LogicSimError, Result};
use crate::gates::{Gate, GateKind};

/// All gates and wires of one circuit level.
///
/// Gates and wires live in slots indexed by their id; pins refer to each
/// other through [`PinRef`] handles, so removing a gate can never leave a
/// dangling pointer behind. `order` is both the z-order (last is front) and
/// the evaluation order within a pass.
#[derive(Debug, Default)]
pub struct Circuit {
    gates: Vec<Option<Gate>>,
    order: Vec<GateId>,
    wires: Vec<Option<Wire>>,
    wire_order: Vec<WireId>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn gate_count(&self) -> usize {
        self.order.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wire_order.len()
    }

    /// Add a gate and return its id.
    pub fn add_gate(&mut self, kind: GateKind) -> GateId {
        let id = GateId(self.gates.len());
        self.gates.push(Some(Gate::new(id, kind)));
        self.order.push(id);
        id
    }

    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(id.0).and_then(Option::as_ref)
    }

    pub fn gate_mut(&mut self, id: GateId) -> Option<&mut Gate> {
        self.gates.get_mut(id.0).and_then(Option::as_mut)
    }

    fn require(&self, id: GateId) -> Result<&Gate> {
        self.gate(id).ok_or(LogicSimError::GateNotFound { gate: id })
    }

    fn require_mut(&mut self, id: GateId) -> Result<&mut Gate> {
        self.gate_mut(id).ok_or(LogicSimError::GateNotFound { gate: id })
    }

    /// Gates in z-order, back to front.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.order.iter().filter_map(|id| self.gate(*id))
    }

    /// Gate ids in z-order, back to front.
    pub fn gate_ids(&self) -> &[GateId] {
        &self.order
    }

    /// First gate carrying `label`, front-most last.
    pub fn find_gate_by_label(&self, label: &str) -> Option<GateId> {
        self.gates().find(|g| g.label() == label).map(Gate::id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.0).and_then(Option::as_ref)
    }

    /// Wires in creation order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wire_order.iter().filter_map(|id| self.wire(*id))
    }

    /// The wire running exactly from `source` to `destination`.
    pub fn find_wire_by_pins(&self, source: PinRef, destination: PinRef) -> Option<WireId> {
        self.wires()
            .find(|w| w.connects(source, destination))
            .map(|w| w.id)
    }

    /// The wire terminating at input pin `destination`.
    pub fn wire_into(&self, destination: PinRef) -> Option<WireId> {
        self.wires()
            .find(|w| w.destination() == destination)
            .map(|w| w.id)
    }

    // ============ Pin access ============

    /// Look up a pin by handle.
    pub fn pin(&self, pin: PinRef) -> Result<&Pin> {
        self.require(pin.gate)?.pin(pin.direction, pin.index)
    }

    /// Effective state of a pin.
    ///
    /// A connected input reads through to its source's state; an
    /// unconnected input returns its buffered state; an output returns its
    /// own state.
    pub fn pin_state(&self, pin: PinRef) -> Result<bool> {
        let local = self.pin(pin)?;
        match local.source() {
            Some(source) if pin.is_input() => Ok(self.pin(source)?.local_state()),
            _ => Ok(local.local_state()),
        }
    }

    /// Write a pin's local state, returning whether it changed.
    ///
    /// A change on an output marks every dependent input's gate dirty; a
    /// change on an input marks its own gate dirty.
    pub fn set_pin_state(&mut self, pin: PinRef, state: bool) -> Result<bool> {
        let changed = self
            .require_mut(pin.gate)?
            .pin_mut(pin.direction, pin.index)?
            .store(state);
        if changed {
            match pin.direction {
                PinDirection::Output => self.mark_dependents_dirty(pin),
                PinDirection::Input => self.mark_dirty(pin.gate),
            }
        }
        Ok(changed)
    }

    /// Effective input states of a gate, in pin order.
    pub fn input_states(&self, id: GateId) -> Vec<bool> {
        let Some(gate) = self.gate(id) else {
            return Vec::new();
        };
        gate.inputs()
            .iter()
            .map(|pin| match pin.source() {
                Some(source) => self.pin(source).map(Pin::local_state).unwrap_or(false),
                None => pin.local_state(),
            })
            .collect()
    }

    /// Point input pin `input` at output pin `source`.
    ///
    /// Any existing upstream connection is replaced; a wire that ended on
    /// the input is removed with it. Registers the input as a dependent of
    /// the source and marks the input's gate dirty.
    pub fn connect_pin(&mut self, input: PinRef, source: PinRef) -> Result<()> {
        check_direction(input, PinDirection::Input)?;
        check_direction(source, PinDirection::Output)?;
        self.pin(source)?;
        self.pin(input)?;

        if let Some(wire) = self.wire_into(input) {
            self.remove_wire(wire)?;
        }
        let previous = self
            .require_mut(input.gate)?
            .pin_mut(PinDirection::Input, input.index)?
            .attach_source(source);
        if let Some(previous) = previous {
            self.forget_dependent(previous, input);
        }
        self.require_mut(source.gate)?
            .pin_mut(PinDirection::Output, source.index)?
            .add_dependent(input);
        self.mark_dirty(input.gate);
        Ok(())
    }

    /// Sever an input pin from its source. Returns `false` if it was not
    /// connected.
    pub fn disconnect_pin(&mut self, input: PinRef) -> Result<bool> {
        check_direction(input, PinDirection::Input)?;
        let previous = self
            .require_mut(input.gate)?
            .pin_mut(PinDirection::Input, input.index)?
            .detach_source();
        match previous {
            Some(source) => {
                self.forget_dependent(source, input);
                self.mark_dirty(input.gate);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn forget_dependent(&mut self, source: PinRef, input: PinRef) {
        if let Some(gate) = self.gate_mut(source.gate) {
            if let Ok(pin) = gate.pin_mut(PinDirection::Output, source.index) {
                pin.remove_dependent(input);
            }
        }
    }

    // ============ Wires ============

    /// Create a wire from output pin `source` to input pin `destination`.
    ///
    /// Fails without touching the graph if either pin is missing or of the
    /// wrong direction, or if the destination already has a source.
    pub fn create_wire(&mut self, source: PinRef, destination: PinRef) -> Result<WireId> {
        check_direction(source, PinDirection::Output)?;
        check_direction(destination, PinDirection::Input)?;
        self.pin(source)?;
        if self.pin(destination)?.is_connected() {
            return Err(LogicSimError::AlreadyConnected {
                gate: destination.gate,
                index: destination.index,
            });
        }

        let id = WireId(self.wires.len());
        self.connect_pin(destination, source)?;
        self.require_mut(source.gate)?.attach_wire(id);
        self.require_mut(destination.gate)?.attach_wire(id);
        self.wires.push(Some(Wire::new(id, source, destination)));
        self.wire_order.push(id);
        Ok(id)
    }

    /// Remove a wire and disconnect its destination pin.
    pub fn remove_wire(&mut self, id: WireId) -> Result<()> {
        let wire = self
            .wires
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(LogicSimError::WireNotFound { wire: id })?;
        self.wire_order.retain(|w| *w != id);

        let destination = wire.destination();
        if let Some(gate) = self.gate_mut(destination.gate) {
            if let Ok(pin) = gate.pin_mut(PinDirection::Input, destination.index) {
                pin.detach_source();
            }
            gate.detach_wire(id);
            gate.mark_dirty();
        }
        self.forget_dependent(wire.source(), destination);
        if let Some(gate) = self.gate_mut(wire.source().gate) {
            gate.detach_wire(id);
        }
        Ok(())
    }

    // ============ Gate removal ============

    /// Remove a gate, first removing every wire touching it.
    ///
    /// Returns the ids of the removed wires.
    pub fn remove_gate(&mut self, id: GateId) -> Result<Vec<WireId>> {
        let wires = self.require_mut(id)?.take_wires();
        for wire in &wires {
            // The gate handed over its list, so the wire may only be gone if
            // it was already removed through the other end.
            if self.wire(*wire).is_some() {
                self.remove_wire(*wire)?;
            }
        }

        // Connections made with `connect_pin` alone have no wire; sever them too.
        let gate = self.require(id)?;
        let upstream: Vec<(PinRef, PinRef)> = gate
            .inputs()
            .iter()
            .filter_map(|pin| pin.source().map(|source| (source, pin.as_ref())))
            .collect();
        let downstream: Vec<PinRef> = gate
            .outputs()
            .iter()
            .flat_map(|pin| pin.dependents().iter().copied())
            .collect();
        for (source, input) in upstream {
            self.forget_dependent(source, input);
        }
        for input in downstream {
            if input.gate != id {
                self.disconnect_pin(input)?;
            }
        }

        self.gates[id.0] = None;
        self.order.retain(|g| *g != id);
        Ok(wires)
    }

    /// Move a gate to the front of the z-order.
    pub fn bring_to_front(&mut self, id: GateId) -> bool {
        match self.order.iter().position(|g| *g == id) {
            Some(index) => {
                let id = self.order.remove(index);
                self.order.push(id);
                true
            }
            None => false,
        }
    }

    /// Move a gate on the canvas.
    pub fn move_gate(&mut self, id: GateId, position: Position) -> bool {
        match self.gate_mut(id) {
            Some(gate) => {
                gate.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Drop all gates and wires and restart id numbering.
    pub fn clear(&mut self) {
        self.gates.clear();
        self.order.clear();
        self.wires.clear();
        self.wire_order.clear();
    }

    // ============ Dirty tracking and propagation ============

    pub fn mark_dirty(&mut self, id: GateId) {
        if let Some(gate) = self.gate_mut(id) {
            gate.mark_dirty();
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for gate in self.gates.iter_mut().flatten() {
            gate.mark_dirty();
        }
    }

    fn mark_dependents_dirty(&mut self, output: PinRef) {
        let dependents: Vec<GateId> = match self.pin(output) {
            Ok(pin) => pin.dependents().iter().map(|p| p.gate).collect(),
            Err(_) => return,
        };
        for gate in dependents {
            self.mark_dirty(gate);
        }
    }

    pub fn any_dirty(&self) -> bool {
        self.gates().any(Gate::is_dirty)
    }

    /// Propagate every wire's source state into its cache. Returns whether
    /// any wire changed; destinations of changed wires are marked dirty.
    pub fn update_wires(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.wire_order.len() {
            let id = self.wire_order[index];
            let Some(source) = self.wire(id).map(Wire::source) else {
                continue;
            };
            let state = self.pin(source).map(Pin::local_state).unwrap_or(false);
            let Some(wire) = self.wires[id.0].as_mut() else {
                continue;
            };
            if wire.update(state) {
                let destination = wire.destination().gate;
                self.mark_dirty(destination);
                changed = true;
            }
        }
        changed
    }

    /// Update every dirty gate in order. Returns whether any gate's outputs
    /// changed; the dependents of a changed gate are marked dirty.
    pub fn update_gates(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.order.len() {
            let id = self.order[index];
            if !self.gate(id).is_some_and(Gate::is_dirty) {
                continue;
            }
            let inputs = self.input_states(id);
            let Some(gate) = self.gate_mut(id) else {
                continue;
            };
            if gate.update(&inputs) {
                changed = true;
                let outputs: Vec<PinRef> = gate.outputs().iter().map(Pin::as_ref).collect();
                for output in outputs {
                    self.mark_dependents_dirty(output);
                }
            }
        }
        changed
    }
}

fn check_direction(pin: PinRef, expected: PinDirection) -> Result<()> {
    if pin.direction == expected {
        Ok(())
    } else {
        Err(LogicSimError::InvalidPinDirection {
            expected,
            found: pin.direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and_with_sources(circuit: &mut Circuit) -> (GateId, GateId, GateId) {
        let a = circuit.add_gate(GateKind::input(false));
        let b = circuit.add_gate(GateKind::input(false));
        let and = circuit.add_gate(GateKind::And);
        circuit
            .create_wire(PinRef::output(a, 0), PinRef::input(and, 0))
            .unwrap();
        circuit
            .create_wire(PinRef::output(b, 0), PinRef::input(and, 1))
            .unwrap();
        (a, b, and)
    }

    #[test]
    fn test_create_wire_registers_both_ends() {
        let mut circuit = Circuit::new();
        let (a, _, and) = and_with_sources(&mut circuit);
        assert_eq!(circuit.wire_count(), 2);
        assert_eq!(circuit.gate(a).unwrap().wires().len(), 1);
        assert_eq!(circuit.gate(and).unwrap().wires().len(), 2);
        let pin = circuit.pin(PinRef::input(and, 0)).unwrap();
        assert_eq!(pin.source(), Some(PinRef::output(a, 0)));
        assert_eq!(
            circuit.pin(PinRef::output(a, 0)).unwrap().dependents(),
            &[PinRef::input(and, 0)]
        );
    }

    #[test]
    fn test_create_wire_rejects_bad_pins() {
        let mut circuit = Circuit::new();
        let (a, b, and) = and_with_sources(&mut circuit);

        // Destination already driven
        assert!(matches!(
            circuit.create_wire(PinRef::output(b, 0), PinRef::input(and, 0)),
            Err(LogicSimError::AlreadyConnected { index: 0, .. })
        ));
        // Directions swapped
        assert!(matches!(
            circuit.create_wire(PinRef::input(and, 0), PinRef::output(a, 0)),
            Err(LogicSimError::InvalidPinDirection { .. })
        ));
        // Out of range
        assert!(matches!(
            circuit.create_wire(PinRef::output(a, 3), PinRef::input(and, 1)),
            Err(LogicSimError::PinOutOfRange { .. })
        ));
        // Missing gate
        assert!(matches!(
            circuit.create_wire(PinRef::output(GateId(42), 0), PinRef::input(and, 1)),
            Err(LogicSimError::GateNotFound { .. })
        ));
        assert_eq!(circuit.wire_count(), 2);
    }

    #[test]
    fn test_input_reads_through_source() {
        let mut circuit = Circuit::new();
        let (a, _, and) = and_with_sources(&mut circuit);
        assert!(circuit.set_pin_state(PinRef::output(a, 0), true).unwrap());
        assert!(circuit.pin_state(PinRef::input(and, 0)).unwrap());
        assert_eq!(circuit.input_states(and), vec![true, false]);
    }

    #[test]
    fn test_output_change_dirties_dependents() {
        let mut circuit = Circuit::new();
        let (a, b, and) = and_with_sources(&mut circuit);
        for id in [a, b, and] {
            circuit.gate_mut(id).unwrap().update(&[false, false]);
        }
        assert!(!circuit.any_dirty());

        assert!(!circuit.set_pin_state(PinRef::output(a, 0), false).unwrap());
        assert!(!circuit.gate(and).unwrap().is_dirty());
        circuit.set_pin_state(PinRef::output(a, 0), true).unwrap();
        assert!(circuit.gate(and).unwrap().is_dirty());
        assert!(!circuit.gate(b).unwrap().is_dirty());
    }

    #[test]
    fn test_unconnected_input_uses_buffer() {
        let mut circuit = Circuit::new();
        let not = circuit.add_gate(GateKind::Not);
        circuit.set_pin_state(PinRef::input(not, 0), true).unwrap();
        assert!(circuit.pin_state(PinRef::input(not, 0)).unwrap());
    }

    #[test]
    fn test_connect_pin_replaces_source() {
        let mut circuit = Circuit::new();
        let (a, b, and) = and_with_sources(&mut circuit);
        circuit
            .connect_pin(PinRef::input(and, 0), PinRef::output(b, 0))
            .unwrap();
        // The old wire is gone and `a` no longer feeds the gate
        assert_eq!(circuit.wire_count(), 1);
        assert!(circuit.pin(PinRef::output(a, 0)).unwrap().dependents().is_empty());
        assert_eq!(
            circuit.pin(PinRef::input(and, 0)).unwrap().source(),
            Some(PinRef::output(b, 0))
        );

        assert!(circuit.disconnect_pin(PinRef::input(and, 0)).unwrap());
        assert!(!circuit.disconnect_pin(PinRef::input(and, 0)).unwrap());
        assert!(circuit
            .connect_pin(PinRef::output(and, 0), PinRef::output(b, 0))
            .is_err());
    }

    #[test]
    fn test_remove_wire_disconnects_destination() {
        let mut circuit = Circuit::new();
        let (a, _, and) = and_with_sources(&mut circuit);
        let wire = circuit
            .find_wire_by_pins(PinRef::output(a, 0), PinRef::input(and, 0))
            .unwrap();
        circuit.remove_wire(wire).unwrap();
        assert!(!circuit.pin(PinRef::input(and, 0)).unwrap().is_connected());
        assert!(circuit.gate(a).unwrap().wires().is_empty());
        assert_eq!(circuit.gate(and).unwrap().wires().len(), 1);
        assert!(matches!(
            circuit.remove_wire(wire),
            Err(LogicSimError::WireNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_gate_detaches_all_wires() {
        let mut circuit = Circuit::new();
        let (a, b, and) = and_with_sources(&mut circuit);
        let removed = circuit.remove_gate(and).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(circuit.wire_count(), 0);
        assert!(circuit.gate(and).is_none());
        for id in [a, b] {
            let gate = circuit.gate(id).unwrap();
            assert!(gate.wires().is_empty());
            assert!(gate.outputs()[0].dependents().is_empty());
        }
        assert!(matches!(
            circuit.remove_gate(and),
            Err(LogicSimError::GateNotFound { .. })
        ));
    }

    #[test]
    fn test_bring_to_front_and_clear() {
        let mut circuit = Circuit::new();
        let (a, b, and) = and_with_sources(&mut circuit);
        assert!(circuit.bring_to_front(a));
        assert_eq!(circuit.gate_ids(), &[b, and, a]);
        assert!(!circuit.bring_to_front(GateId(99)));

        circuit.clear();
        assert!(circuit.is_empty());
        assert_eq!(circuit.wire_count(), 0);
        assert_eq!(circuit.add_gate(GateKind::Not), GateId(0));
    }
}
