use std::io::{self, Read};

use crate::ast::Node;
use crate::cursor::TokenCursor;
use crate::error::{Error, ParseError};
use crate::lexer::{TokenKind, lex};

// ── Parser ────────────────────────────────────────────────────────────────

/// Recursive-descent parser over a [`TokenCursor`]. Lives for one parse
/// call; the first lexical or grammar error aborts the whole run and no
/// partial tree escapes.
pub struct Parser {
    tokens: TokenCursor,
}

impl Parser {
    pub fn new(tokens: TokenCursor) -> Self {
        Self { tokens }
    }

    // ── Document ──────────────────────────────────────────────────────────

    /// Parses `(comment | assignment)* EOF` into a [`Node::Root`].
    ///
    /// Root consumption is structural: comments become children so the tree
    /// can reproduce them in diagnostics.
    pub fn parse_document(&mut self) -> Result<Node, Error> {
        let mut children = Vec::new();
        loop {
            let tok = self.tokens.next_raw();
            match tok.kind {
                TokenKind::Eof => return Ok(Node::Root(children)),
                TokenKind::Error => return Err(Error::Lex(tok.text)),
                TokenKind::Comment => children.push(Node::Comment(tok.text)),
                TokenKind::Key => children.push(self.parse_assignment(tok.text)?),
                kind => {
                    return Err(ParseError::Unexpected {
                        kind,
                        context: "parsing the document root",
                    }
                    .into());
                }
            }
        }
    }

    // ── Assignment ────────────────────────────────────────────────────────

    fn parse_assignment(&mut self, name: String) -> Result<Node, Error> {
        let tok = self.tokens.next();
        match tok.kind {
            TokenKind::Definition => {}
            TokenKind::Error => return Err(Error::Lex(tok.text)),
            TokenKind::Eof => {
                return Err(ParseError::UnexpectedEof { context: "parsing an assignment" }.into());
            }
            kind => return Err(ParseError::ExpectedDefinition { kind }.into()),
        }
        let value = self.parse_value()?;
        Ok(Node::Assignment { name, value: Box::new(value) })
    }

    // ── Value ─────────────────────────────────────────────────────────────

    /// Parses the next value: a single scalar, or an array of scalars.
    fn parse_value(&mut self) -> Result<Node, Error> {
        let tok = self.tokens.peek();
        match tok.kind {
            TokenKind::Value => {
                let tok = self.tokens.next();
                Ok(Node::Value(tok.text))
            }
            TokenKind::ArrayStart => {
                self.tokens.next();
                self.parse_array()
            }
            TokenKind::Error => Err(Error::Lex(tok.text)),
            TokenKind::Eof => {
                Err(ParseError::UnexpectedEof { context: "looking for a value" }.into())
            }
            kind => Err(ParseError::Unexpected { kind, context: "looking for a value" }.into()),
        }
    }

    // ── Array ─────────────────────────────────────────────────────────────

    fn parse_array(&mut self) -> Result<Node, Error> {
        let mut items = Vec::new();
        loop {
            let tok = self.tokens.peek();
            match tok.kind {
                TokenKind::ArrayEnd => {
                    self.tokens.next();
                    return Ok(Node::Array(items));
                }
                TokenKind::Value => items.push(self.parse_value()?),
                TokenKind::Error => return Err(Error::Lex(tok.text)),
                TokenKind::Eof => {
                    return Err(ParseError::UnexpectedEof { context: "parsing an array" }.into());
                }
                kind => {
                    return Err(
                        ParseError::Unexpected { kind, context: "parsing an array" }.into()
                    );
                }
            }
        }
    }
}

// ── Entry points ──────────────────────────────────────────────────────────

/// Parses a descriptor byte stream into its tree. The lexer runs as a
/// concurrent producer; see [`lex`].
pub fn parse_reader<R: Read + Send + 'static>(input: R) -> Result<Node, Error> {
    Parser::new(TokenCursor::new(lex(input))).parse_document()
}

/// Parses an in-memory descriptor source into its tree.
pub fn parse_str(src: &str) -> Result<Node, Error> {
    parse_reader(io::Cursor::new(src.to_owned().into_bytes()))
}

// ── tests ─────────────────────────────────────────────────────────────────
