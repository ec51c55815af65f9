use serde::Serialize;

use crate::error::{BindError, Diagnostic, Error};
use crate::eval::{Mapping, Value};

// ── ModDescriptor ─────────────────────────────────────────────────────────

/// The typed contents of a descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModDescriptor {
    /// Display name of the mod.
    pub name: String,
    /// Mod version: `major.minor.patch`, each component a non-negative
    /// integer or the wildcard `*`.
    pub version: String,
    /// Game version the mod supports, same pattern. Whether it must be
    /// present depends on the file's role (workshop descriptor vs. local
    /// mod pointer), so the binder leaves that policy to the caller.
    pub supported_version: Option<String>,
    /// Mod location, absolute or relative to the user directory.
    pub path: Option<String>,
    /// Workshop file id.
    pub remote_file_id: Option<u64>,
    /// Category tags, in document order.
    pub tags: Vec<String>,
}

/// A bound descriptor together with its non-fatal diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDescriptor {
    pub descriptor: ModDescriptor,
    pub diagnostics: Vec<Diagnostic>,
}

// ── bind ──────────────────────────────────────────────────────────────────

/// Converts the evaluated mapping into the typed record, consuming it.
///
/// Every recognized key is checked against its expected shape; nothing is
/// silently cast or defaulted. Bind errors accumulate over the whole
/// mapping so one report names everything wrong with the file, and any
/// error means no record. Unrecognized keys are never fatal; each one
/// becomes a [`Diagnostic`] on the successful result.
pub fn bind(mapping: Mapping) -> Result<BoundDescriptor, Error> {
    let mut errors = Vec::new();
    let mut diagnostics = Vec::new();

    let mut name = None;
    let mut version = None;
    let mut supported_version = None;
    let mut path = None;
    let mut remote_file_id = None;
    let mut tags = Vec::new();
    // Required-key tracking is separate from the field slots: an invalid
    // `version` was still present, and reporting it as missing on top of
    // the real error would be noise.
    let mut saw_name = false;
    let mut saw_version = false;

    for (key, value) in mapping {
        match key.as_str() {
            "name" => {
                saw_name = true;
                name = scalar("name", value, &mut errors);
            }
            "version" => {
                saw_version = true;
                version = version_scalar("version", value, &mut errors);
            }
            "supported_version" => {
                supported_version = version_scalar("supported_version", value, &mut errors);
            }
            "path" => path = scalar("path", value, &mut errors),
            "remote_file_id" => {
                remote_file_id = integer("remote_file_id", value, &mut errors);
            }
            "tags" => {
                tags = sequence("tags", value, &mut errors).unwrap_or_default();
            }
            _ => diagnostics.push(Diagnostic::UnrecognizedKey(key)),
        }
    }

    if !saw_name {
        errors.push(BindError::MissingRequiredField("name"));
    }
    if !saw_version {
        errors.push(BindError::MissingRequiredField("version"));
    }

    log::debug!(
        "bound descriptor: {} errors, {} diagnostics",
        errors.len(),
        diagnostics.len()
    );

    if let (true, Some(name), Some(version)) = (errors.is_empty(), name, version) {
        Ok(BoundDescriptor {
            descriptor: ModDescriptor {
                name,
                version,
                supported_version,
                path,
                remote_file_id,
                tags,
            },
            diagnostics,
        })
    } else {
        Err(Error::Bind(errors))
    }
}

// ── field shapes ──────────────────────────────────────────────────────────

fn scalar(key: &'static str, value: Value, errors: &mut Vec<BindError>) -> Option<String> {
    match value {
        Value::Scalar(text) => Some(text),
        seq @ Value::Sequence(_) => {
            errors.push(BindError::ShapeMismatch {
                key,
                expected: "a single value",
                found: seq.shape(),
            });
            None
        }
    }
}

fn sequence(key: &'static str, value: Value, errors: &mut Vec<BindError>) -> Option<Vec<String>> {
    match value {
        Value::Sequence(items) => Some(items),
        single @ Value::Scalar(_) => {
            errors.push(BindError::ShapeMismatch {
                key,
                expected: "an array",
                found: single.shape(),
            });
            None
        }
    }
}

fn version_scalar(
    key: &'static str,
    value: Value,
    errors: &mut Vec<BindError>,
) -> Option<String> {
    let text = scalar(key, value, errors)?;
    if is_version(&text) {
        Some(text)
    } else {
        errors.push(BindError::InvalidVersionFormat { key, value: text });
        None
    }
}

fn integer(key: &'static str, value: Value, errors: &mut Vec<BindError>) -> Option<u64> {
    let text = scalar(key, value, errors)?;
    match text.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(BindError::InvalidInteger { key, value: text });
            None
        }
    }
}

/// `major.minor.patch`, each component a run of ASCII digits or the
/// wildcard `*`.
fn is_version(text: &str) -> bool {
    let component = |c: Option<&str>| {
        matches!(c, Some(c) if c == "*" || (!c.is_empty() && c.bytes().all(|b| b.is_ascii_digit())))
    };
    let mut parts = text.split('.');
    component(parts.next())
        && component(parts.next())
        && component(parts.next())
        && parts.next().is_none()
}

// ── tests ─────────────────────────────────────────────────────────────────
