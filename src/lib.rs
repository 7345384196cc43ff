//! # Logicsim Core
//!
//! A simulator for networks of combinational logic gates.
//!
//! This library provides:
//! - A gate graph of sources, sinks, AND/OR/XOR/NOT primitives and custom
//!   gates built from nested sub-circuits
//! - A fixed-point stepper that settles any graph, cyclic or not, and
//!   reports when it oscillates
//! - A small netlist DSL for describing circuits in text
//!
//! ## Architecture
//!
//! - [`circuit`] - Pins, wires, the gate arena, validation and named netlists
//! - [`gates`] - Gate kinds, primitive operators and custom gate definitions
//! - [`solver`] - The simulator and its pass loop
//! - [`dsl`] - Parser for the netlist language
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! logicsim adder.lsim --defs gates.json --set a=1 --truth-table
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmLogicSim } from 'logicsim_core';
//!
//! const sim = new WasmLogicSim(netlistText);
//! sim.set_input("a", true);
//! sim.step();
//! ```
//!
//! ## Simulation Method
//!
//! Each step runs passes until one of them changes nothing:
//!
//! 1. Every wire copies its source pin state, dirtying its destination on change
//! 2. Every dirty gate, in z-order, re-evaluates from its current input states
//!
//! A step that reaches the pass ceiling is reported as oscillating. Results
//! do not depend on z-order once the circuit settles.

pub mod circuit;
pub mod dsl;
pub mod error;
pub mod gates;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{Circuit, GateId, Netlist, PinDirection, PinRef, WireId};
pub use error::{LogicSimError, Result};
pub use gates::{CustomGate, CustomGateDefinition, Gate, GateKind, GateLibrary, GateType};
pub use solver::{Simulator, SimulatorConfig, StepReport, MAX_NESTING_DEPTH, MAX_PASSES};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmLogicSim;
