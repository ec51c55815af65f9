use crate::ast::Node;
use crate::error::EvalError;

// ── Value ─────────────────────────────────────────────────────────────────

/// A generic evaluated value, decided at evaluation time. The binder turns
/// these into typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Sequence(Vec<String>),
}

impl Value {
    /// Shape name used in binder messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "a single value",
            Value::Sequence(_) => "an array",
        }
    }
}

// ── Mapping ───────────────────────────────────────────────────────────────

/// Insertion-ordered key→value mapping with unique keys.
///
/// Inserting an existing key replaces its value in place, so a duplicate
/// assignment keeps the key's original position while the later value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ── evaluate ──────────────────────────────────────────────────────────────

/// Reduces a parse tree to its key→value mapping, consuming it.
///
/// Only assignments contribute; comments evaluate to nothing. A later
/// assignment to the same key wins. Shape checks here are defensive: the
/// parser cannot currently produce a tree that fails them, but a mismatch
/// must fail loudly rather than turn into a placeholder value.
pub fn evaluate(root: Node) -> Result<Mapping, EvalError> {
    let children = match root {
        Node::Root(children) => children,
        other => {
            return Err(EvalError::TypeMismatch {
                expected: "a document root",
                found: other.kind(),
            });
        }
    };

    let mut mapping = Mapping::default();
    for child in children {
        match child {
            Node::Comment(_) => {}
            Node::Assignment { name, value } => {
                mapping.insert(name, evaluate_value(*value)?);
            }
            other => {
                return Err(EvalError::TypeMismatch {
                    expected: "an assignment or a comment",
                    found: other.kind(),
                });
            }
        }
    }
    Ok(mapping)
}

fn evaluate_value(node: Node) -> Result<Value, EvalError> {
    match node {
        Node::Value(text) => Ok(Value::Scalar(text)),
        Node::Array(items) => {
            let mut seq = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Node::Value(text) => seq.push(text),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "a scalar array element",
                            found: other.kind(),
                        });
                    }
                }
            }
            Ok(Value::Sequence(seq))
        }
        other => Err(EvalError::TypeMismatch {
            expected: "a value or an array",
            found: other.kind(),
        }),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────
