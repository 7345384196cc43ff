//! Connection points on a gate.

use super::types::{GateId, PinDirection, PinRef};

/// A typed connection point on a gate.
///
/// Input pins hold at most one upstream source and a buffered state that is
/// used while unconnected. Output pins hold their driven state and the list
/// of input pins that read from them.
#[derive(Debug, Clone)]
pub struct Pin {
    owner: GateId,
    direction: PinDirection,
    index: usize,
    state: bool,
    /// Upstream output pin (inputs only)
    source: Option<PinRef>,
    /// Downstream input pins (outputs only)
    dependents: Vec<PinRef>,
}

impl Pin {
    /// Create an unconnected pin with a low state.
    pub fn new(owner: GateId, direction: PinDirection, index: usize) -> Self {
        Self {
            owner,
            direction,
            index,
            state: false,
            source: None,
            dependents: Vec::new(),
        }
    }

    pub fn owner(&self) -> GateId {
        self.owner
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Handle to this pin.
    pub fn as_ref(&self) -> PinRef {
        PinRef {
            gate: self.owner,
            direction: self.direction,
            index: self.index,
        }
    }

    /// The locally stored state. For a connected input this is only the
    /// buffered fallback; the effective value is read through the source.
    pub fn local_state(&self) -> bool {
        self.state
    }

    /// Store a new local state, returning whether it changed.
    pub fn store(&mut self, state: bool) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    pub fn source(&self) -> Option<PinRef> {
        self.source
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Replace the upstream source, returning the previous one.
    pub(crate) fn attach_source(&mut self, source: PinRef) -> Option<PinRef> {
        debug_assert_eq!(self.direction, PinDirection::Input);
        self.source.replace(source)
    }

    pub(crate) fn detach_source(&mut self) -> Option<PinRef> {
        self.source.take()
    }

    pub fn dependents(&self) -> &[PinRef] {
        &self.dependents
    }

    pub(crate) fn add_dependent(&mut self, pin: PinRef) {
        debug_assert_eq!(self.direction, PinDirection::Output);
        if !self.dependents.contains(&pin) {
            self.dependents.push(pin);
        }
    }

    pub(crate) fn remove_dependent(&mut self, pin: PinRef) {
        self.dependents.retain(|p| *p != pin);
    }

    /// Drop every dependent whose owner is `gate`.
    pub(crate) fn forget_gate(&mut self, gate: GateId) {
        self.dependents.retain(|p| p.gate != gate);
    }
}
