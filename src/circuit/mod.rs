//! Circuit graph representation and validation.
//!
//! This module provides the per-level arena of gates and wires. Pins, wires
//! and dependent lists refer to one another through [`GateId`], [`WireId`]
//! and [`PinRef`] handles rather than pointers. A [`Netlist`] wraps a
//! simulator built from the netlist DSL together with its name table.

mod graph;
mod netlist;
mod pin;
mod types;
mod validate;
mod wire;

pub use graph::Circuit;
pub use netlist::{Netlist, TruthRow, TruthTable, MAX_TRUTH_TABLE_INPUTS};
pub use pin::Pin;
pub use types::*;
pub use validate::validate_circuit;
pub use wire::Wire;
