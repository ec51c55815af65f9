//! Lexer, parser, evaluator, and binder for Paradox-style **mod descriptor**
//! files (`*.mod`): `key = value` and `key = { value... }` pairs with `#`
//! line comments.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`lexer`] | `Token`, `TokenKind`, the concurrent scanner |
//! | [`cursor`] | `TokenCursor` (peek/unread over the token stream) |
//! | [`ast`] | `Node` parse tree |
//! | [`parser`] | recursive descent, `parse_str`/`parse_reader` |
//! | [`eval`] | `Mapping`, `Value`, `evaluate` |
//! | [`bind`] | `ModDescriptor`, `BoundDescriptor`, `bind` |
//! | [`error`] | the error taxonomy |
//!
//! # Quick start
//!
//! ```rust
//! let src = r#"
//!     ## workshop upload
//!     name = "My Mod"
//!     version = "1.0.0"
//!     tags = { "Fun" "Gameplay" }
//! "#;
//!
//! let bound = moddesc::from_str(src).unwrap();
//! assert_eq!(bound.descriptor.name, "My Mod");
//! assert_eq!(bound.descriptor.tags, ["Fun", "Gameplay"]);
//! ```
//!
//! The lexer runs as a producer thread feeding a bounded token channel, so
//! parsing overlaps scanning and the token sequence is never materialized.
//! An aborting parse disconnects the channel, which stops the producer.
//!
//! Each call parses one stream independently; nothing is shared or cached
//! between calls. Callers with many files should treat every file's parse
//! as its own failure domain.

pub mod ast;
pub mod bind;
pub mod cursor;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::io::{self, Read};

pub use ast::Node;
pub use bind::{BoundDescriptor, ModDescriptor, bind};
pub use error::{BindError, Diagnostic, Error, EvalError, ParseError};
pub use eval::{Mapping, Value, evaluate};
pub use lexer::{Token, TokenKind};
pub use parser::{parse_reader, parse_str};

/// Runs the whole pipeline over a byte stream: lex, parse, evaluate, bind.
///
/// Returns the typed record with its diagnostics, or the first error. The
/// stream is read once and never rewound; to retry, re-invoke with a fresh
/// stream.
pub fn from_reader<R: Read + Send + 'static>(input: R) -> Result<BoundDescriptor, Error> {
    let root = parser::parse_reader(input)?;
    log::debug!("parse tree:\n{}", root.pretty());
    bind::bind(eval::evaluate(root)?)
}

/// Runs the whole pipeline over an in-memory source string.
pub fn from_str(src: &str) -> Result<BoundDescriptor, Error> {
    from_reader(io::Cursor::new(src.to_owned().into_bytes()))
}
