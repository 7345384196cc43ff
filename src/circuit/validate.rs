//! Circuit validation.

use crate::error::{LogicSimError, Result};

use super::{Circuit, PinDirection};

/// Check that a circuit holds no dangling references.
///
/// Checks:
/// - Every wire's pins exist, and its destination reads from its source
/// - Every gate's wire list names live wires touching that gate
/// - Every dependent of an output pin reads from that pin
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    for wire in circuit.wires() {
        circuit.pin(wire.source()).map_err(|e| topology(format!("{}: {}", wire.id, e)))?;
        let destination = circuit
            .pin(wire.destination())
            .map_err(|e| topology(format!("{}: {}", wire.id, e)))?;
        if destination.source() != Some(wire.source()) {
            return Err(topology(format!(
                "{} ends at {} which reads from {:?}",
                wire.id,
                wire.destination(),
                destination.source()
            )));
        }
    }

    for gate in circuit.gates() {
        for id in gate.wires() {
            match circuit.wire(*id) {
                Some(wire) if wire.touches(gate.id()) => {}
                Some(_) => return Err(topology(format!("{} lists unrelated {}", gate.id(), id))),
                None => return Err(topology(format!("{} lists removed {}", gate.id(), id))),
            }
        }

        for output in gate.outputs() {
            for dependent in output.dependents() {
                let pin = circuit
                    .pin(*dependent)
                    .map_err(|e| topology(format!("{} dependent: {}", output.as_ref(), e)))?;
                if pin.direction() != PinDirection::Input || pin.source() != Some(output.as_ref()) {
                    return Err(topology(format!(
                        "{} lists {} which does not read from it",
                        output.as_ref(),
                        dependent
                    )));
                }
            }
        }
    }

    Ok(())
}

fn topology(message: String) -> LogicSimError {
    LogicSimError::InvalidTopology { message }
}
