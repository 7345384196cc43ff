//! Netlist language for describing gate circuits.
//!
//! The DSL is line-oriented and human-editable. It is a front end for the
//! command line and WASM builds, not a save format.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist     = { line }
//! line        = comment | directive | gate | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = ".input" name [ "0" | "1" ]
//!             | ".output" name signal
//!             | ".passes" number
//! gate        = kind name { signal }
//!
//! kind        = "AND" | "OR" | "XOR" | "NOT" | "INPUT" | "OUTPUT" | library name
//! signal      = name [ '.' digit+ ]
//! name        = (letter | '_') { letter | digit | '_' }
//! ```
//!
//! A signal names an output pin of a gate: `h` is pin 0, `h.1` is pin 1.
//! Signals may refer to gates declared further down, and feedback loops
//! are allowed.
//!
//! # Example
//!
//! ```text
//! # Half adder
//! .input a
//! .input b 1
//! .output sum s
//! .output carry c
//!
//! XOR s a b
//! AND c a b
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a netlist string into an AST.
pub fn parse(input: &str) -> Result<CircuitAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a netlist file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<CircuitAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::LogicSimError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
