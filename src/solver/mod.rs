//! Fixed-point solver for combinational circuits.
//!
//! Each [`Simulator::step`] runs repeated passes over the circuit until
//! nothing changes:
//!
//! 1. Update every wire: copy its source state into its cache, marking the
//!    destination gate dirty when the value differs
//! 2. Update every dirty gate in z-order, collecting whether any outputs changed
//! 3. Stop as soon as a pass changes no wire, no gate, and leaves no gate dirty
//!
//! Evaluation order inside a pass only affects how many passes are needed,
//! not the settled values. A circuit that never settles (a NOT gate driving
//! its own input, for example) runs into the pass ceiling and is reported as
//! oscillating; the solver does not try to break the loop.

mod simulator;

pub use simulator::{Simulator, SimulatorConfig, StepReport};

/// Maximum passes per step before a circuit is reported as oscillating.
pub const MAX_PASSES: usize = 64;

/// Maximum custom gate nesting depth.
pub const MAX_NESTING_DEPTH: usize = 16;
