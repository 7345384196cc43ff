//! Lexer (tokenizer) for the netlist DSL.

use crate::error::{LogicSimError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Gate kind, gate name or signal (`h`, `h.1`)
    Identifier,
    /// Unsigned integer
    Number,
    /// A directive (starts with '.')
    Directive,
    Newline,
    Eof,
}

/// Lexer for tokenizing netlist input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind, text| Token {
            kind,
            text,
            line,
            column,
        };

        let ch = match self.chars.peek().copied() {
            Some(ch) => ch,
            None => return Ok(token(TokenKind::Eof, String::new())),
        };

        match ch {
            '\n' => {
                self.advance();
                Ok(token(TokenKind::Newline, "\n".to_string()))
            }
            '.' => {
                self.advance();
                let name = self.read_word();
                if name.is_empty() {
                    return Err(LogicSimError::lexer(line, column, "empty directive"));
                }
                Ok(token(TokenKind::Directive, format!(".{}", name)))
            }
            '0'..='9' => {
                let text = self.read_word();
                if text.chars().all(|c| c.is_ascii_digit()) {
                    Ok(token(TokenKind::Number, text))
                } else {
                    Err(LogicSimError::lexer(
                        line,
                        column,
                        format!("names must not start with a digit: '{}'", text),
                    ))
                }
            }
            _ if ch.is_alphabetic() || ch == '_' => Ok(token(TokenKind::Identifier, self.read_word())),
            _ => Err(LogicSimError::lexer(
                line,
                column,
                format!("unexpected character '{}'", ch),
            )),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else if ch == '#' || ch == ';' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Alphanumerics, underscores and dots (for `name.N` signals).
    fn read_word(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            kinds.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return kinds;
            }
        }
    }

    #[test]
    fn test_lexer_gate_line() {
        let mut lexer = Lexer::new("XOR s h.1 b_2");

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "XOR");

        lexer.next_token().unwrap();
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.text, "h.1");
        assert_eq!(tok.column, 7);
    }

    #[test]
    fn test_lexer_directive() {
        let mut lexer = Lexer::new(".input a 1");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Directive);
        assert_eq!(tok.text, ".input");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number);
    }

    #[test]
    fn test_lexer_comments_and_lines() {
        use TokenKind::*;
        assert_eq!(
            kinds("# header\nNOT x a ; trailing\n\n"),
            vec![Newline, Identifier, Identifier, Identifier, Newline, Newline, Eof]
        );
    }

    #[test]
    fn test_lexer_errors() {
        let mut lexer = Lexer::new("\n  AND @");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(LogicSimError::LexerError { line: 2, column: 7, .. })
        ));
        assert!(Lexer::new("1abc").next_token().is_err());
        assert!(Lexer::new(". x").next_token().is_err());
    }
}
