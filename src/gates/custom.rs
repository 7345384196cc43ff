//! Hierarchical gates backed by a nested simulator.

use std::collections::HashMap;

use super::definition::{CustomGateDefinition, GateLibrary, PinMapping};
use super::{Gate, GateKind, GateType};
use crate::circuit::{GateId, PinDirection, PinRef};
use crate::error::{LogicSimError, Result};
use crate::solver::{Simulator, SimulatorConfig, StepReport};

/// Where an external input lands inside the nested circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InternalInput {
    /// Drives an internal Input source gate
    Source(GateId),
    /// Drives the buffered state of an unconnected internal input pin
    Pin(PinRef),
}

/// Where an external output is read from inside the nested circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InternalOutput {
    /// Reads the active flag of an internal Output sink gate
    Sink(GateId),
    /// Reads an internal output pin
    Pin(PinRef),
}

#[derive(Debug, Clone, Copy)]
struct InputBinding {
    external: usize,
    target: InternalInput,
}

#[derive(Debug, Clone, Copy)]
struct OutputBinding {
    external: usize,
    target: InternalOutput,
}

/// A gate whose behaviour is an embedded circuit.
///
/// Evaluation copies the external inputs into the nested circuit, runs the
/// nested simulator to a fixed point, and copies the mapped internal
/// outputs back out. A gate whose definition fails setup keeps its declared
/// pin counts but never evaluates; its outputs hold their last value.
#[derive(Debug)]
pub struct CustomGate {
    name: String,
    category: String,
    input_count: usize,
    output_count: usize,
    simulator: Simulator,
    inputs: Vec<InputBinding>,
    outputs: Vec<OutputBinding>,
    error: Option<LogicSimError>,
    last_report: Option<StepReport>,
}

impl CustomGate {
    /// Instantiate a definition. Never fails: setup errors are logged once
    /// and leave the gate inert (see [`CustomGate::error`]).
    pub fn new(definition: &CustomGateDefinition, library: &GateLibrary, config: &SimulatorConfig) -> Self {
        let mut stack = Vec::new();
        match Self::build(definition, library, config, &mut stack) {
            Ok(gate) => gate,
            Err(error) => {
                clilog::warn!(
                    "custom gate '{}' is invalid and will not evaluate: {}",
                    definition.name,
                    error
                );
                Self::inert(definition, config, error)
            }
        }
    }

    fn inert(definition: &CustomGateDefinition, config: &SimulatorConfig, error: LogicSimError) -> Self {
        Self {
            name: definition.name.clone(),
            category: definition.category.clone(),
            input_count: definition.input_count,
            output_count: definition.output_count,
            simulator: Simulator::with_config(config.clone()),
            inputs: Vec::new(),
            outputs: Vec::new(),
            error: Some(error),
            last_report: None,
        }
    }

    /// Instantiate with a stack of definition names currently being built,
    /// rejecting cycles and excessive depth before descending.
    fn build(
        definition: &CustomGateDefinition,
        library: &GateLibrary,
        config: &SimulatorConfig,
        stack: &mut Vec<String>,
    ) -> Result<Self> {
        if stack.iter().any(|name| *name == definition.name) {
            let mut chain = stack.clone();
            chain.push(definition.name.clone());
            return Err(LogicSimError::RecursiveDefinition { chain });
        }
        if stack.len() >= config.max_nesting_depth {
            return Err(LogicSimError::NestingTooDeep {
                name: definition.name.clone(),
                limit: config.max_nesting_depth,
            });
        }

        stack.push(definition.name.clone());
        let result = Self::build_body(definition, library, config, stack);
        stack.pop();
        result
    }

    fn build_body(
        definition: &CustomGateDefinition,
        library: &GateLibrary,
        config: &SimulatorConfig,
        stack: &mut Vec<String>,
    ) -> Result<Self> {
        let name = &definition.name;
        check_mapping_coverage(definition)?;

        let mut simulator = Simulator::with_config(config.clone());
        let mut local: HashMap<u32, GateId> = HashMap::with_capacity(definition.gates.len());

        for descriptor in &definition.gates {
            if local.contains_key(&descriptor.id) {
                return Err(LogicSimError::invalid_definition(
                    name,
                    format!("internal gate id {} declared twice", descriptor.id),
                ));
            }
            let kind = match GateType::from_name(&descriptor.kind).and_then(GateKind::primitive) {
                Some(kind) => kind,
                None => {
                    let nested = library.get(&descriptor.kind).ok_or_else(|| {
                        LogicSimError::UnknownDefinition {
                            name: descriptor.kind.clone(),
                        }
                    })?;
                    GateKind::Custom(Box::new(Self::build(nested, library, config, stack)?))
                }
            };
            let id = simulator.add_gate(kind);
            simulator.move_gate(id, descriptor.position);
            local.insert(descriptor.id, id);
        }

        let resolve = |local_id: u32| -> Result<GateId> {
            local.get(&local_id).copied().ok_or_else(|| {
                LogicSimError::invalid_definition(name, format!("references undeclared internal gate {local_id}"))
            })
        };

        for wire in &definition.wires {
            let source = PinRef::output(resolve(wire.from_gate)?, wire.from_pin);
            let destination = PinRef::input(resolve(wire.to_gate)?, wire.to_pin);
            simulator.create_wire(source, destination)?;
        }

        let mut inputs = Vec::new();
        for mapping in definition.input_mappings() {
            let gate = gate_of(&simulator, resolve(mapping.gate)?)?;
            inputs.push(InputBinding {
                external: mapping.external_pin,
                target: resolve_input(name, gate, mapping)?,
            });
        }

        let mut outputs = Vec::new();
        for mapping in definition.output_mappings() {
            let gate = gate_of(&simulator, resolve(mapping.gate)?)?;
            outputs.push(OutputBinding {
                external: mapping.external_pin,
                target: resolve_output(gate, mapping)?,
            });
        }

        Ok(Self {
            name: definition.name.clone(),
            category: definition.category.clone(),
            input_count: definition.input_count,
            output_count: definition.output_count,
            simulator,
            inputs,
            outputs,
            error: None,
            last_report: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// The setup failure that made this gate inert.
    pub fn error(&self) -> Option<&LogicSimError> {
        self.error.as_ref()
    }

    /// The nested simulator.
    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Report from the most recent nested step.
    pub fn last_report(&self) -> Option<StepReport> {
        self.last_report
    }

    /// Drive the nested circuit from `inputs` and write the mapped results
    /// into `outputs`. Inert gates leave `outputs` untouched.
    pub(crate) fn evaluate(&mut self, inputs: &[bool], outputs: &mut [bool]) {
        if self.error.is_some() {
            return;
        }

        for binding in &self.inputs {
            let value = inputs.get(binding.external).copied().unwrap_or(false);
            // Targets were resolved against this simulator during setup
            let _ = match binding.target {
                InternalInput::Source(gate) => self.simulator.set_source(gate, value),
                InternalInput::Pin(pin) => self.simulator.set_input_state(pin.gate, pin.index, value),
            };
        }

        let report = self.simulator.step();
        if report.oscillating {
            clilog::debug!(
                "nested circuit of '{}' did not settle after {} passes",
                self.name,
                report.passes
            );
        }
        self.last_report = Some(report);

        for binding in &self.outputs {
            let value = match binding.target {
                InternalOutput::Sink(gate) => self.simulator.gate(gate).and_then(Gate::is_active),
                InternalOutput::Pin(pin) => self
                    .simulator
                    .gate(pin.gate)
                    .and_then(|g| g.output_state(pin.index).ok()),
            };
            if let Some(slot) = outputs.get_mut(binding.external) {
                *slot = value.unwrap_or(false);
            }
        }
    }
}

/// Every external pin must be mapped; indices must be in range and each
/// external output may have only one source.
fn check_mapping_coverage(definition: &CustomGateDefinition) -> Result<()> {
    let name = &definition.name;
    let mut inputs_seen = vec![false; definition.input_count];
    let mut outputs_seen = vec![false; definition.output_count];

    for mapping in &definition.mappings {
        let (seen, direction) = if mapping.is_input {
            (&mut inputs_seen, PinDirection::Input)
        } else {
            (&mut outputs_seen, PinDirection::Output)
        };
        let count = seen.len();
        let slot = seen.get_mut(mapping.external_pin).ok_or_else(|| {
            LogicSimError::invalid_definition(
                name,
                format!(
                    "maps external {} pin {} but only {} declared",
                    direction, mapping.external_pin, count
                ),
            )
        })?;
        if *slot && !mapping.is_input {
            return Err(LogicSimError::invalid_definition(
                name,
                format!("external output pin {} mapped more than once", mapping.external_pin),
            ));
        }
        *slot = true;
    }

    if let Some(index) = inputs_seen.iter().position(|seen| !seen) {
        return Err(LogicSimError::UnmappedPin {
            name: name.clone(),
            direction: PinDirection::Input,
            index,
        });
    }
    if let Some(index) = outputs_seen.iter().position(|seen| !seen) {
        return Err(LogicSimError::UnmappedPin {
            name: name.clone(),
            direction: PinDirection::Output,
            index,
        });
    }
    Ok(())
}

fn gate_of(simulator: &Simulator, id: GateId) -> Result<&Gate> {
    simulator.gate(id).ok_or(LogicSimError::GateNotFound { gate: id })
}

fn resolve_input(name: &str, gate: &Gate, mapping: &PinMapping) -> Result<InternalInput> {
    if gate.gate_type() == GateType::Input {
        if mapping.pin != 0 {
            return Err(LogicSimError::PinOutOfRange {
                gate: gate.id(),
                direction: PinDirection::Output,
                index: mapping.pin,
                count: 1,
            });
        }
        return Ok(InternalInput::Source(gate.id()));
    }
    if gate.inputs().is_empty() {
        return Err(LogicSimError::InvalidPinDirection {
            expected: PinDirection::Input,
            found: PinDirection::Output,
        });
    }
    let pin = gate.pin(PinDirection::Input, mapping.pin)?;
    if pin.is_connected() {
        return Err(LogicSimError::invalid_definition(
            name,
            format!(
                "external input {} drives {} which is already wired",
                mapping.external_pin,
                pin.as_ref()
            ),
        ));
    }
    Ok(InternalInput::Pin(pin.as_ref()))
}

fn resolve_output(gate: &Gate, mapping: &PinMapping) -> Result<InternalOutput> {
    if gate.gate_type() == GateType::Output {
        if mapping.pin != 0 {
            return Err(LogicSimError::PinOutOfRange {
                gate: gate.id(),
                direction: PinDirection::Input,
                index: mapping.pin,
                count: 1,
            });
        }
        return Ok(InternalOutput::Sink(gate.id()));
    }
    if gate.outputs().is_empty() {
        return Err(LogicSimError::InvalidPinDirection {
            expected: PinDirection::Output,
            found: PinDirection::Input,
        });
    }
    let pin = gate.pin(PinDirection::Output, mapping.pin)?;
    Ok(InternalOutput::Pin(pin.as_ref()))
}
