//! Parser for the netlist DSL.

use std::collections::HashSet;

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{LogicSimError, Result};

/// Parser for netlist DSL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser, reading the first token.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<CircuitAst> {
        let mut ast = CircuitAst::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier => {
                    let gate = self.parse_gate()?;
                    ast.gates.push(gate);
                }
                TokenKind::Number | TokenKind::Eof => {
                    return Err(LogicSimError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
            self.end_of_line()?;
        }

        check_unique_names(&ast)?;
        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(LogicSimError::parse(
                self.current.line,
                format!("expected {}, got {:?}", what, self.current.text),
            ))
        }
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(LogicSimError::parse(
                self.current.line,
                format!("unexpected trailing token: {:?}", self.current.text),
            )),
        }
    }

    /// A plain name: no `.N` suffix.
    fn expect_name(&mut self) -> Result<String> {
        let tok = self.expect(TokenKind::Identifier, "name")?;
        if tok.text.contains('.') {
            return Err(LogicSimError::parse(
                tok.line,
                format!("'{}' is a signal, not a name", tok.text),
            ));
        }
        Ok(tok.text)
    }

    fn expect_signal(&mut self) -> Result<SignalRef> {
        let tok = self.expect(TokenKind::Identifier, "signal")?;
        self.signal(&tok)
    }

    fn signal(&self, tok: &Token) -> Result<SignalRef> {
        SignalRef::parse(&tok.text)
            .ok_or_else(|| LogicSimError::parse(tok.line, format!("malformed signal '{}'", tok.text)))
    }

    fn expect_number(&mut self) -> Result<usize> {
        let tok = self.expect(TokenKind::Number, "number")?;
        tok.text
            .parse()
            .map_err(|_| LogicSimError::parse(tok.line, format!("number out of range: {}", tok.text)))
    }

    fn parse_directive(&mut self, ast: &mut CircuitAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".input" => {
                let name = self.expect_name()?;
                let initial = if self.current.kind == TokenKind::Number {
                    match self.expect_number()? {
                        0 => false,
                        1 => true,
                        other => {
                            return Err(LogicSimError::parse(
                                line,
                                format!("input value must be 0 or 1, got {}", other),
                            ))
                        }
                    }
                } else {
                    false
                };
                ast.inputs.push(InputDef { name, initial, line });
            }
            ".output" => {
                let name = self.expect_name()?;
                let signal = self.expect_signal()?;
                ast.outputs.push(OutputDef { name, signal, line });
            }
            ".passes" => {
                if ast.max_passes.is_some() {
                    return Err(LogicSimError::parse(line, "duplicate .passes directive"));
                }
                ast.max_passes = Some(self.expect_number()?);
            }
            _ => {
                return Err(LogicSimError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    fn parse_gate(&mut self) -> Result<GateDef> {
        let line = self.current.line;
        let kind = self.expect_name()?;
        let name = self.expect_name()?;

        let mut inputs = Vec::new();
        while self.current.kind == TokenKind::Identifier {
            inputs.push(self.expect_signal()?);
        }

        Ok(GateDef {
            kind,
            name,
            inputs,
            line,
        })
    }
}

fn check_unique_names(ast: &CircuitAst) -> Result<()> {
    let mut seen = HashSet::new();
    for name in ast.names() {
        if !seen.insert(name) {
            return Err(LogicSimError::DuplicateGate {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    #[test]
    fn test_parse_gate() {
        let ast = parse("XOR s a h.1").unwrap();
        assert_eq!(ast.gates.len(), 1);
        let gate = &ast.gates[0];
        assert_eq!(gate.kind, "XOR");
        assert_eq!(gate.name, "s");
        assert_eq!(gate.inputs, vec![SignalRef::new("a", 0), SignalRef::new("h", 1)]);
        assert_eq!(gate.line, 1);
    }

    #[test]
    fn test_parse_input_output() {
        let ast = parse(".input a 1\n.input b\n.output y x\n.passes 32\nNOT x a").unwrap();
        assert_eq!(
            ast.inputs,
            vec![
                InputDef { name: "a".into(), initial: true, line: 1 },
                InputDef { name: "b".into(), initial: false, line: 2 },
            ]
        );
        assert_eq!(ast.outputs[0].signal, SignalRef::new("x", 0));
        assert_eq!(ast.max_passes, Some(32));
        assert_eq!(ast.gates[0].line, 5);
    }

    #[test]
    fn test_parse_with_comments() {
        let input = "# This is a comment\nAND c a b ; inline comment style\n\n";
        let ast = parse(input).unwrap();
        assert_eq!(ast.gates.len(), 1);
    }

    #[test]
    fn test_parse_gate_without_inputs() {
        let ast = parse("BUS_CONST k").unwrap();
        assert!(ast.gates[0].inputs.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse(".input a 2"),
            Err(LogicSimError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            parse("\n.wire a b"),
            Err(LogicSimError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            parse(".input a 1 1"),
            Err(LogicSimError::ParseError { .. })
        ));
        assert!(matches!(parse("AND c.1 a b"), Err(LogicSimError::ParseError { .. })));
        assert!(matches!(parse(".output y"), Err(LogicSimError::ParseError { .. })));
        assert!(matches!(parse("AND c a.x"), Err(LogicSimError::ParseError { .. })));
        assert!(matches!(
            parse(".input a\nNOT a a"),
            Err(LogicSimError::DuplicateGate { .. })
        ));
    }
}
