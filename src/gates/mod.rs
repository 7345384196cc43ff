//! Gate models for logic simulation.
//!
//! This module provides the closed set of gate kinds:
//! - Sources and sinks: Input, Output
//! - Primitives: AND, OR, XOR, NOT
//! - Hierarchical: custom gates embedding a nested simulator
//!
//! Every kind evaluates through a single match in [`GateKind::evaluate`].
//! [`Gate::update`] is the shared driver that skips clean gates and reports
//! whether any output changed.

mod custom;
mod definition;
mod primitives;

pub use custom::CustomGate;
pub use definition::{CustomGateDefinition, GateDescriptor, GateLibrary, PinMapping, WireDescriptor};
pub use primitives::{InputSource, Operator, OutputSink};

use std::fmt;

use crate::circuit::{GateId, Pin, PinDirection, Position, Size, WireId};
use crate::error::{LogicSimError, Result};
use crate::solver::SimulatorConfig;

/// Kind tag for a gate, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateType {
    Input,
    Output,
    And,
    Or,
    Xor,
    Not,
    Custom,
}

impl GateType {
    /// Parse a primitive kind name. Custom gates are resolved through a
    /// [`GateLibrary`] instead.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INPUT" | "IN" => Some(Self::Input),
            "OUTPUT" | "OUT" => Some(Self::Output),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "XOR" => Some(Self::Xor),
            "NOT" | "INV" => Some(Self::Not),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A gate's behaviour.
#[derive(Debug)]
pub enum GateKind {
    Input(InputSource),
    Output(OutputSink),
    And,
    Or,
    Xor,
    Not,
    Custom(Box<CustomGate>),
}

impl GateKind {
    /// A source gate with the given initial value.
    pub fn input(value: bool) -> Self {
        GateKind::Input(InputSource::new(value))
    }

    /// A sink gate.
    pub fn output() -> Self {
        GateKind::Output(OutputSink::default())
    }

    /// Build a primitive kind from its tag. Returns `None` for
    /// [`GateType::Custom`].
    pub fn primitive(gate_type: GateType) -> Option<Self> {
        match gate_type {
            GateType::Input => Some(Self::input(false)),
            GateType::Output => Some(Self::output()),
            GateType::And => Some(Self::And),
            GateType::Or => Some(Self::Or),
            GateType::Xor => Some(Self::Xor),
            GateType::Not => Some(Self::Not),
            GateType::Custom => None,
        }
    }

    /// Resolve a kind name: primitives first, then the library.
    ///
    /// A library definition that fails setup still yields a (permanently
    /// inert) custom gate; only an unknown name is an error.
    pub fn from_name(name: &str, library: &GateLibrary, config: &SimulatorConfig) -> Result<Self> {
        if let Some(kind) = GateType::from_name(name).and_then(Self::primitive) {
            return Ok(kind);
        }
        let definition = library
            .get(name)
            .ok_or_else(|| LogicSimError::UnknownDefinition {
                name: name.to_string(),
            })?;
        Ok(GateKind::Custom(Box::new(CustomGate::new(
            definition, library, config,
        ))))
    }

    pub fn gate_type(&self) -> GateType {
        match self {
            GateKind::Input(_) => GateType::Input,
            GateKind::Output(_) => GateType::Output,
            GateKind::And => GateType::And,
            GateKind::Or => GateType::Or,
            GateKind::Xor => GateType::Xor,
            GateKind::Not => GateType::Not,
            GateKind::Custom(_) => GateType::Custom,
        }
    }

    /// The boolean operator for AND/OR/XOR/NOT.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            GateKind::And => Some(Operator::And),
            GateKind::Or => Some(Operator::Or),
            GateKind::Xor => Some(Operator::Xor),
            GateKind::Not => Some(Operator::Not),
            _ => None,
        }
    }

    pub fn input_count(&self) -> usize {
        match self {
            GateKind::Input(_) => 0,
            GateKind::Output(_) => 1,
            GateKind::Custom(c) => c.input_count(),
            _ => self.operator().map_or(0, |op| op.input_count()),
        }
    }

    pub fn output_count(&self) -> usize {
        match self {
            GateKind::Output(_) => 0,
            GateKind::Custom(c) => c.output_count(),
            _ => 1,
        }
    }

    /// Display name: the definition name for custom gates.
    pub fn name(&self) -> &str {
        match self {
            GateKind::Custom(c) => c.name(),
            _ => self.gate_type().name(),
        }
    }

    fn default_size(&self) -> Size {
        match self {
            GateKind::Input(_) | GateKind::Output(_) => Size::new(40.0, 40.0),
            GateKind::Custom(c) => Size::for_pin_count(c.input_count().max(c.output_count())),
            _ => Size::default(),
        }
    }

    /// Compute outputs from inputs. `outputs` holds the previous output
    /// states on entry; kinds that produce nothing leave it untouched.
    pub fn evaluate(&mut self, inputs: &[bool], outputs: &mut [bool]) {
        match self {
            GateKind::Input(source) => {
                if let Some(out) = outputs.first_mut() {
                    *out = source.value;
                }
            }
            GateKind::Output(sink) => {
                sink.active = inputs.first().copied().unwrap_or(false);
            }
            GateKind::And => outputs[0] = Operator::And.apply(inputs),
            GateKind::Or => outputs[0] = Operator::Or.apply(inputs),
            GateKind::Xor => outputs[0] = Operator::Xor.apply(inputs),
            GateKind::Not => outputs[0] = Operator::Not.apply(inputs),
            GateKind::Custom(custom) => custom.evaluate(inputs, outputs),
        }
    }
}

/// A gate placed in a circuit: kind, pins, geometry and dirty flag.
#[derive(Debug)]
pub struct Gate {
    id: GateId,
    label: String,
    kind: GateKind,
    position: Position,
    size: Size,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
    /// Wires touching any pin of this gate
    wires: Vec<WireId>,
    dirty: bool,
}

impl Gate {
    /// Create a gate with the pin layout fixed by its kind. New gates start
    /// dirty so the first step evaluates them.
    pub fn new(id: GateId, kind: GateKind) -> Self {
        let inputs = (0..kind.input_count())
            .map(|i| Pin::new(id, PinDirection::Input, i))
            .collect();
        let outputs = (0..kind.output_count())
            .map(|i| Pin::new(id, PinDirection::Output, i))
            .collect();
        Self {
            id,
            label: kind.name().to_string(),
            size: kind.default_size(),
            kind,
            position: Position::default(),
            inputs,
            outputs,
            wires: Vec::new(),
            dirty: true,
        }
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn kind(&self) -> &GateKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut GateKind {
        &mut self.kind
    }

    pub fn gate_type(&self) -> GateType {
        self.kind.gate_type()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    /// Look up a pin by direction and index.
    pub fn pin(&self, direction: PinDirection, index: usize) -> Result<&Pin> {
        let pins = match direction {
            PinDirection::Input => &self.inputs,
            PinDirection::Output => &self.outputs,
        };
        pins.get(index).ok_or(LogicSimError::PinOutOfRange {
            gate: self.id,
            direction,
            index,
            count: pins.len(),
        })
    }

    pub(crate) fn pin_mut(&mut self, direction: PinDirection, index: usize) -> Result<&mut Pin> {
        let id = self.id;
        let pins = match direction {
            PinDirection::Input => &mut self.inputs,
            PinDirection::Output => &mut self.outputs,
        };
        let count = pins.len();
        pins.get_mut(index).ok_or(LogicSimError::PinOutOfRange {
            gate: id,
            direction,
            index,
            count,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Queue the gate for re-evaluation.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Set the buffered state of an input pin. The value takes effect while
    /// the pin has no upstream source. Returns whether it changed.
    pub fn set_input_state(&mut self, index: usize, state: bool) -> Result<bool> {
        let changed = self.pin_mut(PinDirection::Input, index)?.store(state);
        if changed {
            self.dirty = true;
        }
        Ok(changed)
    }

    /// Current state of output pin `index`.
    pub fn output_state(&self, index: usize) -> Result<bool> {
        Ok(self.pin(PinDirection::Output, index)?.local_state())
    }

    /// Current output states, in pin order.
    pub fn output_states(&self) -> Vec<bool> {
        self.outputs.iter().map(Pin::local_state).collect()
    }

    /// Re-evaluate if dirty.
    ///
    /// `inputs` are the effective input states (read through any upstream
    /// source). Clears the dirty flag and returns whether any output pin
    /// changed; a clean gate is a no-op returning `false`.
    pub fn update(&mut self, inputs: &[bool]) -> bool {
        if !self.dirty {
            return false;
        }
        let previous = self.output_states();
        let mut next = previous.clone();
        self.kind.evaluate(inputs, &mut next);
        self.dirty = false;

        let mut changed = false;
        for (pin, state) in self.outputs.iter_mut().zip(next) {
            changed |= pin.store(state);
        }
        changed
    }

    /// Wires attached to any pin of this gate.
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    pub(crate) fn attach_wire(&mut self, wire: WireId) {
        if !self.wires.contains(&wire) {
            self.wires.push(wire);
        }
    }

    pub(crate) fn detach_wire(&mut self, wire: WireId) {
        self.wires.retain(|w| *w != wire);
    }

    /// First half of the deletion handshake: hand back the de-duplicated
    /// set of attached wires and clear the association list.
    pub(crate) fn take_wires(&mut self) -> Vec<WireId> {
        let mut wires = std::mem::take(&mut self.wires);
        wires.sort();
        wires.dedup();
        wires
    }

    /// Value of an Input source gate.
    pub fn source_value(&self) -> Option<bool> {
        match &self.kind {
            GateKind::Input(source) => Some(source.value),
            _ => None,
        }
    }

    /// Toggle target of an Input source gate. Marks the gate dirty on change.
    pub fn set_source_value(&mut self, value: bool) -> Result<bool> {
        match &mut self.kind {
            GateKind::Input(source) => {
                let changed = source.set(value);
                if changed {
                    self.dirty = true;
                }
                Ok(changed)
            }
            _ => Err(LogicSimError::WrongGateKind {
                gate: self.id,
                expected: "an input source",
            }),
        }
    }

    /// Active flag of an Output sink gate.
    pub fn is_active(&self) -> Option<bool> {
        match &self.kind {
            GateKind::Output(sink) => Some(sink.active),
            _ => None,
        }
    }

    /// The embedded custom gate, if any.
    pub fn as_custom(&self) -> Option<&CustomGate> {
        match &self.kind {
            GateKind::Custom(custom) => Some(custom),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pin_layouts() {
        let cases = [
            (GateKind::input(false), 0, 1),
            (GateKind::output(), 1, 0),
            (GateKind::And, 2, 1),
            (GateKind::Or, 2, 1),
            (GateKind::Xor, 2, 1),
            (GateKind::Not, 1, 1),
        ];
        for (kind, inputs, outputs) in cases {
            let name = kind.name().to_string();
            let gate = Gate::new(GateId(0), kind);
            assert_eq!(gate.inputs().len(), inputs, "{name}");
            assert_eq!(gate.outputs().len(), outputs, "{name}");
            assert!(gate.is_dirty());
        }
    }

    #[test]
    fn test_update_skips_clean_gate() {
        let mut gate = Gate::new(GateId(0), GateKind::Not);
        assert!(gate.update(&[false]));
        assert!(gate.output_state(0).unwrap());
        assert!(!gate.is_dirty());

        // Not dirty: inputs are ignored
        assert!(!gate.update(&[true]));
        assert!(gate.output_state(0).unwrap());
    }

    #[test]
    fn test_update_reports_unchanged_output() {
        let mut gate = Gate::new(GateId(0), GateKind::And);
        assert!(!gate.update(&[true, false]));
        gate.mark_dirty();
        assert!(gate.update(&[true, true]));
        gate.mark_dirty();
        assert!(!gate.update(&[true, true]));
    }

    #[test]
    fn test_source_and_sink() {
        let mut source = Gate::new(GateId(0), GateKind::input(true));
        assert!(source.update(&[]));
        assert!(source.output_state(0).unwrap());
        assert!(!source.set_source_value(true).unwrap());
        assert!(source.set_source_value(false).unwrap());
        assert!(source.is_dirty());

        let mut sink = Gate::new(GateId(1), GateKind::output());
        assert!(!sink.update(&[true]));
        assert_eq!(sink.is_active(), Some(true));
        assert!(sink.set_source_value(true).is_err());
    }

    #[test]
    fn test_set_input_state_marks_dirty() {
        let mut gate = Gate::new(GateId(0), GateKind::Or);
        gate.update(&[false, false]);
        assert!(gate.set_input_state(1, true).unwrap());
        assert!(gate.is_dirty());
        assert!(matches!(
            gate.set_input_state(2, true),
            Err(LogicSimError::PinOutOfRange { index: 2, count: 2, .. })
        ));
    }

    #[test]
    fn test_take_wires_dedups_and_clears() {
        let mut gate = Gate::new(GateId(0), GateKind::And);
        gate.attach_wire(WireId(3));
        gate.attach_wire(WireId(1));
        gate.attach_wire(WireId(3));
        assert_eq!(gate.take_wires(), vec![WireId(1), WireId(3)]);
        assert!(gate.wires().is_empty());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(GateType::from_name("and"), Some(GateType::And));
        assert_eq!(GateType::from_name("INV"), Some(GateType::Not));
        assert_eq!(GateType::from_name("nand"), None);
        assert!(GateKind::primitive(GateType::Custom).is_none());
    }

    #[test]
    fn test_default_geometry() {
        let gate = Gate::new(GateId(0), GateKind::And);
        assert_relative_eq!(gate.size().width, 60.0);
        assert_relative_eq!(gate.size().height, 40.0);
        assert_eq!(gate.label(), "AND");
    }
}
