//! Named circuits built from the netlist DSL.

use std::collections::HashMap;
use std::fmt;

use super::types::{GateId, PinRef, Position};
use crate::dsl::{self, CircuitAst, SignalRef};
use crate::error::{LogicSimError, Result};
use crate::gates::{GateKind, GateLibrary};
use crate::solver::{Simulator, SimulatorConfig, StepReport};

/// Widest input set [`Netlist::truth_table`] will sweep.
pub const MAX_TRUTH_TABLE_INPUTS: usize = 16;

/// Horizontal spacing between layout columns.
const COLUMN_SPACING: f32 = 150.0;
/// Vertical spacing between gates in a column.
const ROW_SPACING: f32 = 60.0;

/// A simulator plus the names its gates were declared with.
#[derive(Debug)]
pub struct Netlist {
    simulator: Simulator,
    names: HashMap<String, GateId>,
    inputs: Vec<(String, GateId)>,
    outputs: Vec<(String, GateId)>,
}

impl Netlist {
    /// Parse DSL text and build it.
    pub fn parse(input: &str, library: &GateLibrary, config: SimulatorConfig) -> Result<Self> {
        Self::from_ast(dsl::parse(input)?, library, config)
    }

    /// Build a circuit from a parsed AST.
    ///
    /// Gate kinds resolve to primitives first, then to `library`. Signals
    /// may be referenced before they are declared.
    pub fn from_ast(ast: CircuitAst, library: &GateLibrary, config: SimulatorConfig) -> Result<Self> {
        let config = match ast.max_passes {
            Some(passes) => config.with_max_passes(passes),
            None => config,
        };
        config.validate()?;

        let mut netlist = Netlist {
            simulator: Simulator::with_config(config.clone()),
            names: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        };

        // Sources in the first column
        for (row, input) in ast.inputs.iter().enumerate() {
            let id = netlist.declare(&input.name, GateKind::input(input.initial), 0, row)?;
            netlist.inputs.push((input.name.clone(), id));
        }

        let mut gate_ids = Vec::with_capacity(ast.gates.len());
        for (row, def) in ast.gates.iter().enumerate() {
            let kind = GateKind::from_name(&def.kind, library, &config).map_err(|e| match e {
                LogicSimError::UnknownDefinition { .. } => LogicSimError::UnknownGateType {
                    kind: def.kind.clone(),
                    line: def.line,
                },
                other => other,
            })?;
            if let GateKind::Custom(custom) = &kind {
                if let Some(error) = custom.error() {
                    clilog::warn!("line {}: gate '{}' will not evaluate: {}", def.line, def.name, error);
                }
            }
            let expected = kind.input_count();
            if def.inputs.len() != expected {
                return Err(LogicSimError::parse(
                    def.line,
                    format!(
                        "gate '{}' ({}) expects {} inputs, got {}",
                        def.name,
                        def.kind,
                        expected,
                        def.inputs.len()
                    ),
                ));
            }
            gate_ids.push(netlist.declare(&def.name, kind, 1, row)?);
        }

        let mut sink_ids = Vec::with_capacity(ast.outputs.len());
        for (row, output) in ast.outputs.iter().enumerate() {
            let id = netlist.declare(&output.name, GateKind::output(), 2, row)?;
            netlist.outputs.push((output.name.clone(), id));
            sink_ids.push(id);
        }

        for (def, &id) in ast.gates.iter().zip(&gate_ids) {
            for (index, signal) in def.inputs.iter().enumerate() {
                netlist.connect(signal, PinRef::input(id, index))?;
            }
        }
        for (output, &id) in ast.outputs.iter().zip(&sink_ids) {
            netlist.connect(&output.signal, PinRef::input(id, 0))?;
        }

        clilog::info!(
            "built netlist: {} inputs, {} gates, {} outputs, {} wires",
            netlist.inputs.len(),
            gate_ids.len(),
            netlist.outputs.len(),
            netlist.simulator.wires().count()
        );
        Ok(netlist)
    }

    fn declare(&mut self, name: &str, kind: GateKind, column: usize, row: usize) -> Result<GateId> {
        if self.names.contains_key(name) {
            return Err(LogicSimError::DuplicateGate {
                name: name.to_string(),
            });
        }
        let position = Position::new(column as f32 * COLUMN_SPACING, row as f32 * ROW_SPACING);
        let id = self.simulator.add_gate_at(kind, position);
        if let Some(gate) = self.simulator.gate_mut(id) {
            gate.set_label(name);
        }
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    fn connect(&mut self, signal: &SignalRef, destination: PinRef) -> Result<()> {
        let source = self.signal_pin(signal)?;
        self.simulator.create_wire(source, destination)?;
        Ok(())
    }

    fn signal_pin(&self, signal: &SignalRef) -> Result<PinRef> {
        let gate = self.gate_id(&signal.gate)?;
        Ok(PinRef::output(gate, signal.pin))
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.simulator
    }

    /// Gate declared under `name`.
    pub fn gate_id(&self, name: &str) -> Result<GateId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| LogicSimError::SignalNotFound {
                signal: name.to_string(),
            })
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(name, _)| name.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(name, _)| name.as_str())
    }

    /// Set a declared input. Takes effect on the next step.
    pub fn set_input(&mut self, name: &str, value: bool) -> Result<bool> {
        let id = self.gate_id(name)?;
        self.simulator.set_source(id, value)
    }

    /// Current value of a declared output.
    pub fn output(&self, name: &str) -> Result<bool> {
        let id = self.gate_id(name)?;
        self.simulator.is_active(id)
    }

    /// All outputs in declaration order.
    pub fn outputs(&self) -> Vec<(&str, bool)> {
        self.outputs
            .iter()
            .map(|(name, id)| (name.as_str(), self.simulator.is_active(*id).unwrap_or(false)))
            .collect()
    }

    /// Current value of any signal, written `gate` or `gate.N`.
    pub fn signal(&self, signal: &str) -> Result<bool> {
        let signal = SignalRef::parse(signal).ok_or_else(|| LogicSimError::SignalNotFound {
            signal: signal.to_string(),
        })?;
        let pin = self.signal_pin(&signal)?;
        self.simulator.circuit().pin_state(pin)
    }

    pub fn step(&mut self) -> StepReport {
        self.simulator.step()
    }

    /// Step once for every combination of input values.
    ///
    /// The first declared input is the most significant bit of the row
    /// index. Input values are restored afterwards.
    pub fn truth_table(&mut self) -> Result<TruthTable> {
        let count = self.inputs.len();
        if count > MAX_TRUTH_TABLE_INPUTS {
            return Err(LogicSimError::InvalidSimulationParam {
                message: format!(
                    "truth table needs at most {} inputs, circuit has {}",
                    MAX_TRUTH_TABLE_INPUTS, count
                ),
            });
        }

        let ids: Vec<GateId> = self.inputs.iter().map(|(_, id)| *id).collect();
        let saved: Vec<bool> = ids
            .iter()
            .map(|id| {
                self.simulator
                    .gate(*id)
                    .and_then(|g| g.source_value())
                    .unwrap_or(false)
            })
            .collect();

        let mut rows = Vec::with_capacity(1 << count);
        for bits in 0u32..(1u32 << count) {
            let inputs: Vec<bool> = (0..count).map(|i| bits & (1 << (count - 1 - i)) != 0).collect();
            for (id, value) in ids.iter().zip(&inputs) {
                self.simulator.set_source(*id, *value)?;
            }
            let report = self.simulator.step();
            let outputs = self.outputs().into_iter().map(|(_, v)| v).collect();
            rows.push(TruthRow {
                inputs,
                outputs,
                stable: report.stable,
            });
        }

        for (id, value) in ids.iter().zip(saved) {
            self.simulator.set_source(*id, value)?;
        }
        self.simulator.step();

        Ok(TruthTable {
            inputs: self.input_names().map(str::to_string).collect(),
            outputs: self.output_names().map(str::to_string).collect(),
            rows,
        })
    }
}

/// One row of a [`TruthTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthRow {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
    /// Whether the circuit settled for this row
    pub stable: bool,
}

/// Outputs for every input combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub rows: Vec<TruthRow>,
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<&str> = self.inputs.iter().map(String::as_str).collect();
        let outputs: Vec<&str> = self.outputs.iter().map(String::as_str).collect();
        writeln!(f, "{} | {}", header.join(" "), outputs.join(" "))?;

        for row in &self.rows {
            let cells = |names: &[&str], values: &[bool]| -> String {
                names
                    .iter()
                    .zip(values)
                    .map(|(name, v)| format!("{:<width$}", u8::from(*v), width = name.len()))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            write!(f, "{} | {}", cells(&header, &row.inputs), cells(&outputs, &row.outputs))?;
            if !row.stable {
                write!(f, "  (oscillating)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
