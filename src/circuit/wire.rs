//! Directed connections from an output pin to an input pin.

use super::types::{PinRef, WireId};

/// A wire from one output pin to one input pin.
///
/// The wire caches the last state it propagated. [`Wire::update`] compares
/// the source's current state against that cache so the simulator can tell
/// whether anything travelled along the wire during a pass.
#[derive(Debug, Clone)]
pub struct Wire {
    pub id: WireId,
    source: PinRef,
    destination: PinRef,
    state: bool,
}

impl Wire {
    /// Create a wire. Direction checks happen in
    /// [`Circuit::create_wire`](super::Circuit::create_wire) before this is called.
    pub(crate) fn new(id: WireId, source: PinRef, destination: PinRef) -> Self {
        debug_assert!(source.is_output() && destination.is_input());
        Self {
            id,
            source,
            destination,
            state: false,
        }
    }

    pub fn source(&self) -> PinRef {
        self.source
    }

    pub fn destination(&self) -> PinRef {
        self.destination
    }

    /// Last propagated state.
    pub fn state(&self) -> bool {
        self.state
    }

    /// Whether the wire connects `source` to `destination` exactly.
    pub fn connects(&self, source: PinRef, destination: PinRef) -> bool {
        self.source == source && self.destination == destination
    }

    /// Whether either end of the wire sits on a pin of `gate`.
    pub fn touches(&self, gate: super::GateId) -> bool {
        self.source.gate == gate || self.destination.gate == gate
    }

    /// Take the source state. Returns `true` when it differs from the cache,
    /// in which case the caller must mark the destination gate dirty.
    pub fn update(&mut self, source_state: bool) -> bool {
        if source_state == self.state {
            return false;
        }
        self.state = source_state;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateId;

    #[test]
    fn test_update_compares_against_cache() {
        let mut wire = Wire::new(
            WireId(0),
            PinRef::output(GateId(0), 0),
            PinRef::input(GateId(1), 0),
        );
        assert!(!wire.update(false));
        assert!(wire.update(true));
        assert!(wire.state());
        assert!(!wire.update(true));
        assert!(wire.update(false));
    }

    #[test]
    fn test_touches_and_connects() {
        let src = PinRef::output(GateId(4), 0);
        let dst = PinRef::input(GateId(7), 1);
        let wire = Wire::new(WireId(2), src, dst);
        assert!(wire.touches(GateId(4)));
        assert!(wire.touches(GateId(7)));
        assert!(!wire.touches(GateId(5)));
        assert!(wire.connects(src, dst));
        assert!(!wire.connects(src, PinRef::input(GateId(7), 0)));
    }
}
