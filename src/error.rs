//! Error types for the logic simulator.
//!
//! This module provides a unified error type [`LogicSimError`] that covers
//! DSL parsing, graph mutation, custom gate setup and configuration.
//! Oscillation is not an error: it is reported through
//! [`StepReport`](crate::solver::StepReport).

use thiserror::Error;

use crate::circuit::{GateId, PinDirection, WireId};

/// Result type alias using [`LogicSimError`].
pub type Result<T> = std::result::Result<T, LogicSimError>;

/// Unified error type for all logic simulator operations.
#[derive(Error, Debug)]
pub enum LogicSimError {
    // ============ DSL Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Gate kind that is neither a primitive nor a library definition
    #[error("Unknown gate type '{kind}' at line {line}")]
    UnknownGateType { kind: String, line: usize },

    /// Duplicate gate name in a netlist
    #[error("Duplicate gate name '{name}'")]
    DuplicateGate { name: String },

    /// Signal referenced but never declared
    #[error("Signal '{signal}' not found in netlist")]
    SignalNotFound { signal: String },

    // ============ Graph Mutation Errors ============
    /// Gate handle does not refer to a live gate
    #[error("Gate {gate} not found")]
    GateNotFound { gate: GateId },

    /// Wire handle does not refer to a live wire
    #[error("Wire {wire} not found")]
    WireNotFound { wire: WireId },

    /// Pin index outside the gate's fixed layout
    #[error("{direction} pin {index} out of range on gate {gate} ({count} available)")]
    PinOutOfRange {
        gate: GateId,
        direction: PinDirection,
        index: usize,
        count: usize,
    },

    /// Pin used in the wrong role
    #[error("Expected {expected} pin, got {found} pin")]
    InvalidPinDirection {
        expected: PinDirection,
        found: PinDirection,
    },

    /// Destination input already has an upstream wire
    #[error("Input pin {index} of gate {gate} is already connected")]
    AlreadyConnected { gate: GateId, index: usize },

    /// Operation on a gate of the wrong kind
    #[error("Gate {gate} is not {expected}")]
    WrongGateKind { gate: GateId, expected: &'static str },

    // ============ Custom Gate Definition Errors ============
    /// Definition name not present in the gate library
    #[error("Unknown custom gate definition '{name}'")]
    UnknownDefinition { name: String },

    /// Structurally invalid definition
    #[error("Invalid custom gate definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    /// External pin with no internal mapping
    #[error("Custom gate '{name}': external {direction} pin {index} is not mapped")]
    UnmappedPin {
        name: String,
        direction: PinDirection,
        index: usize,
    },

    /// Definition that (transitively) contains itself
    #[error("Recursive custom gate definition: {}", chain.join(" -> "))]
    RecursiveDefinition { chain: Vec<String> },

    /// Nesting deeper than the configured limit
    #[error("Custom gate '{name}' nested too deep (limit {limit})")]
    NestingTooDeep { name: String, limit: usize },

    // ============ Simulation Errors ============
    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    /// Circuit failed a structural integrity check
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    // ============ I/O Errors ============
    /// Error reading a circuit or definition file
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed definition JSON
    #[cfg(feature = "serde")]
    #[error("Failed to decode gate definitions: {source}")]
    DefinitionDecodeError {
        #[from]
        source: serde_json::Error,
    },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl LogicSimError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid definition error
    pub fn invalid_definition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            message: message.into(),
        }
    }
}
