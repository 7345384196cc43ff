//! Abstract Syntax Tree types for the netlist DSL.

use std::fmt;

/// Complete AST representation of a parsed netlist.
#[derive(Debug, Clone, Default)]
pub struct CircuitAst {
    /// Source gates declared with `.input`
    pub inputs: Vec<InputDef>,
    /// Sink gates declared with `.output`
    pub outputs: Vec<OutputDef>,
    /// Gate lines, in file order
    pub gates: Vec<GateDef>,
    /// Pass ceiling from a `.passes` directive
    pub max_passes: Option<usize>,
}

impl CircuitAst {
    /// Create a new empty circuit AST.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every declared name, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(|i| i.name.as_str())
            .chain(self.gates.iter().map(|g| g.name.as_str()))
            .chain(self.outputs.iter().map(|o| o.name.as_str()))
    }
}

/// `.input <name> [0|1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDef {
    pub name: String,
    pub initial: bool,
    pub line: usize,
}

/// `.output <name> <signal>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDef {
    pub name: String,
    pub signal: SignalRef,
    pub line: usize,
}

/// A gate line: `<KIND> <name> <signal>*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDef {
    /// Primitive name or custom definition name, as written
    pub kind: String,
    pub name: String,
    /// One signal per input pin
    pub inputs: Vec<SignalRef>,
    /// Source line number for error reporting
    pub line: usize,
}

/// An output pin of a named gate, written `name` or `name.N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalRef {
    pub gate: String,
    pub pin: usize,
}

impl SignalRef {
    pub fn new(gate: impl Into<String>, pin: usize) -> Self {
        Self {
            gate: gate.into(),
            pin,
        }
    }

    /// Split `name.N` into gate name and pin index.
    pub fn parse(text: &str) -> Option<Self> {
        match text.rsplit_once('.') {
            Some((gate, pin)) if !gate.is_empty() => {
                let pin = pin.parse().ok()?;
                Some(Self::new(gate, pin))
            }
            Some(_) => None,
            None if text.is_empty() => None,
            None => Some(Self::new(text, 0)),
        }
    }
}

impl fmt::Display for SignalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pin == 0 {
            write!(f, "{}", self.gate)
        } else {
            write!(f, "{}.{}", self.gate, self.pin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_ref_parse() {
        assert_eq!(SignalRef::parse("a"), Some(SignalRef::new("a", 0)));
        assert_eq!(SignalRef::parse("h.1"), Some(SignalRef::new("h", 1)));
        assert_eq!(SignalRef::parse("h.x"), None);
        assert_eq!(SignalRef::parse(".1"), None);
        assert_eq!(SignalRef::parse(""), None);
        assert_eq!(SignalRef::new("h", 1).to_string(), "h.1");
        assert_eq!(SignalRef::new("h", 0).to_string(), "h");
    }
}
