//! Core types for circuit representation.

use std::fmt;

/// A unique identifier for a gate within one simulator level.
///
/// Ids are handed out in increasing order and never reused until the
/// owning circuit is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId(pub usize);

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// A unique identifier for a wire within one simulator level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// Whether a pin consumes or drives a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PinDirection {
    Input,
    Output,
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinDirection::Input => write!(f, "input"),
            PinDirection::Output => write!(f, "output"),
        }
    }
}

/// Handle to a pin: owning gate, direction and index in that gate's layout.
///
/// This is the back-reference a pin, wire or dependent list holds instead
/// of a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinRef {
    pub gate: GateId,
    pub direction: PinDirection,
    pub index: usize,
}

impl PinRef {
    /// Reference input pin `index` of `gate`.
    pub fn input(gate: GateId, index: usize) -> Self {
        Self {
            gate,
            direction: PinDirection::Input,
            index,
        }
    }

    /// Reference output pin `index` of `gate`.
    pub fn output(gate: GateId, index: usize) -> Self {
        Self {
            gate,
            direction: PinDirection::Output,
            index,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.direction {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        };
        write!(f, "{}.{}{}", self.gate, tag, self.index)
    }
}

/// Position of a gate on the editor canvas. Not used by simulation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by another position treated as an offset.
    pub fn offset(&self, by: Position) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }
}

/// Size of a gate on the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Height needed to stack `pins` pins at the standard spacing.
    pub fn for_pin_count(pins: usize) -> Self {
        let rows = pins.max(2) as f32;
        Self {
            width: 80.0,
            height: rows * 20.0 + 10.0,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(60.0, 40.0)
    }
}
