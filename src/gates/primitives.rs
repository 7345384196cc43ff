//! Primitive gates: sources, sinks and the boolean operators.

/// Evaluation rule for the two-input operators and NOT.
///
/// Each rule is a pure function of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Xor,
    Not,
}

impl Operator {
    /// Number of input pins for this operator.
    pub fn input_count(&self) -> usize {
        match self {
            Operator::Not => 1,
            Operator::And | Operator::Or | Operator::Xor => 2,
        }
    }

    /// Apply the operator.
    pub fn apply(&self, inputs: &[bool]) -> bool {
        match self {
            Operator::And => inputs.iter().all(|&v| v),
            Operator::Or => inputs.iter().any(|&v| v),
            Operator::Xor => inputs.first() != inputs.get(1),
            Operator::Not => !inputs.first().copied().unwrap_or(false),
        }
    }
}

/// An externally toggled signal source (no inputs, one output).
#[derive(Debug, Clone, Default)]
pub struct InputSource {
    pub value: bool,
}

impl InputSource {
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    /// Set the value, returning whether it changed.
    pub fn set(&mut self, value: bool) -> bool {
        let changed = self.value != value;
        self.value = value;
        changed
    }
}

/// An observable signal sink (one input, no outputs).
#[derive(Debug, Clone, Default)]
pub struct OutputSink {
    pub active: bool,
}
