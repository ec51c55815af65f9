use thiserror::Error;

use crate::lexer::TokenKind;

// ── Pipeline error ────────────────────────────────────────────────────────

/// Any failure of the descriptor pipeline. A failed stage aborts the whole
/// run; no partial record is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The lexer hit a malformed character sequence or could not read the
    /// input stream. The message is the text of the `Error` token it emitted.
    #[error("lex error: {0}")]
    Lex(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Binding failed. All bind errors found in one pass are reported
    /// together, so a descriptor missing both required keys lists both.
    #[error("cannot bind descriptor: {}", join(.0))]
    Bind(Vec<BindError>),
}

fn join(errors: &[BindError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ── ParseError ────────────────────────────────────────────────────────────

/// A grammar violation found while building the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token kind that cannot appear at the current grammar position.
    #[error("unexpected {kind} while {context}")]
    Unexpected {
        kind: TokenKind,
        context: &'static str,
    },
    /// A key was not followed by `=`.
    #[error("unexpected {kind} after an identifier key, expected a definition")]
    ExpectedDefinition { kind: TokenKind },
    /// The input ended inside an open construct.
    #[error("unexpected end of input while {context}")]
    UnexpectedEof { context: &'static str },
}

// ── EvalError ─────────────────────────────────────────────────────────────

/// A parse-tree node whose shape does not fit the position it appears in.
/// Not reachable from the parser's output today; the evaluator still checks
/// rather than substituting a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

// ── BindError ─────────────────────────────────────────────────────────────

/// A reason the evaluated mapping cannot become a typed descriptor record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("missing required key `{0}`")]
    MissingRequiredField(&'static str),
    /// Versions are `major.minor.patch`; each component is a non-negative
    /// integer or the wildcard `*`.
    #[error("key `{key}`: `{value}` is not a version number")]
    InvalidVersionFormat { key: &'static str, value: String },
    #[error("key `{key}`: `{value}` is not a non-negative integer")]
    InvalidInteger { key: &'static str, value: String },
    #[error("key `{key}` expects {expected}, found {found}")]
    ShapeMismatch {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

// ── Diagnostic ────────────────────────────────────────────────────────────

/// A non-fatal finding reported alongside a successfully bound descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("unrecognized key `{0}`")]
    UnrecognizedKey(String),
}
