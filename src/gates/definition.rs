//! Custom gate definitions and the library that holds them.
//!
//! A definition is plain data handed over by the surrounding application
//! (typically loaded from disk). It is consumed, not owned, by
//! [`CustomGate`](super::CustomGate).

use std::collections::HashMap;

use crate::circuit::Position;

/// One internal gate of a definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateDescriptor {
    /// Local id, unique within the definition
    pub id: u32,
    /// Primitive kind name or the name of another definition
    pub kind: String,
    /// Position relative to the custom gate
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Position,
}

/// One internal wire, addressed by local gate id and pin index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WireDescriptor {
    pub from_gate: u32,
    pub from_pin: usize,
    pub to_gate: u32,
    pub to_pin: usize,
}

/// Binds one external pin to one internal pin.
///
/// Several mappings may share an external input index; all of them are
/// driven during evaluation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinMapping {
    pub external_pin: usize,
    pub gate: u32,
    pub pin: usize,
    /// `true` for an external input, `false` for an external output
    pub is_input: bool,
}

/// A reusable sub-circuit exposed as a single gate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomGateDefinition {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: String,
    pub input_count: usize,
    pub output_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub gates: Vec<GateDescriptor>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub wires: Vec<WireDescriptor>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mappings: Vec<PinMapping>,
}

impl CustomGateDefinition {
    /// Start an empty definition with the given external pin counts.
    pub fn new(name: impl Into<String>, input_count: usize, output_count: usize) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            input_count,
            output_count,
            gates: Vec::new(),
            wires: Vec::new(),
            mappings: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add an internal gate at the origin.
    pub fn gate(self, id: u32, kind: impl Into<String>) -> Self {
        self.gate_at(id, kind, Position::default())
    }

    /// Add an internal gate at a relative position.
    pub fn gate_at(mut self, id: u32, kind: impl Into<String>, position: Position) -> Self {
        self.gates.push(GateDescriptor {
            id,
            kind: kind.into(),
            position,
        });
        self
    }

    /// Add an internal wire from output `from_pin` of `from_gate` to input
    /// `to_pin` of `to_gate`.
    pub fn wire(mut self, from_gate: u32, from_pin: usize, to_gate: u32, to_pin: usize) -> Self {
        self.wires.push(WireDescriptor {
            from_gate,
            from_pin,
            to_gate,
            to_pin,
        });
        self
    }

    /// Map external input `external_pin` onto an internal gate.
    pub fn map_input(mut self, external_pin: usize, gate: u32, pin: usize) -> Self {
        self.mappings.push(PinMapping {
            external_pin,
            gate,
            pin,
            is_input: true,
        });
        self
    }

    /// Map external output `external_pin` onto an internal gate.
    pub fn map_output(mut self, external_pin: usize, gate: u32, pin: usize) -> Self {
        self.mappings.push(PinMapping {
            external_pin,
            gate,
            pin,
            is_input: false,
        });
        self
    }

    pub fn input_mappings(&self) -> impl Iterator<Item = &PinMapping> {
        self.mappings.iter().filter(|m| m.is_input)
    }

    pub fn output_mappings(&self) -> impl Iterator<Item = &PinMapping> {
        self.mappings.iter().filter(|m| !m.is_input)
    }

    /// Names of other definitions this one instantiates directly.
    pub fn referenced_kinds(&self) -> impl Iterator<Item = &str> {
        self.gates.iter().map(|g| g.kind.as_str())
    }
}

/// Registry of custom gate definitions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct GateLibrary {
    definitions: HashMap<String, CustomGateDefinition>,
}

impl GateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition, returning the previous one.
    pub fn insert(&mut self, definition: CustomGateDefinition) -> Option<CustomGateDefinition> {
        self.definitions.insert(definition.name.clone(), definition)
    }

    pub fn get(&self, name: &str) -> Option<&CustomGateDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<CustomGateDefinition> {
        self.definitions.remove(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definition names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Definitions in a given category.
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CustomGateDefinition> {
        self.definitions.values().filter(move |d| d.category == category)
    }

    /// Decode a JSON array of definitions and add them.
    #[cfg(feature = "serde")]
    pub fn extend_from_json(&mut self, json: &str) -> crate::error::Result<usize> {
        let definitions: Vec<CustomGateDefinition> = serde_json::from_str(json)?;
        let count = definitions.len();
        for definition in definitions {
            self.insert(definition);
        }
        Ok(count)
    }

    /// Read a JSON definition file and add its definitions.
    #[cfg(feature = "serde")]
    pub fn load_file(&mut self, path: &std::path::Path) -> crate::error::Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::error::LogicSimError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        self.extend_from_json(&content)
    }
}

impl FromIterator<CustomGateDefinition> for GateLibrary {
    fn from_iter<I: IntoIterator<Item = CustomGateDefinition>>(iter: I) -> Self {
        let mut library = Self::new();
        for definition in iter {
            library.insert(definition);
        }
        library
    }
}
