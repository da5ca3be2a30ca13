//! Error families, one per recovery policy.

use std::path::PathBuf;

use thiserror::Error;

use crate::field::FieldError;
use crate::kind::ObjectKind;
use crate::syntax::Violation;

/// A row that failed its kind's syntax checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} '{name}' failed syntax checks: {}", render_violations(.violations))]
pub struct SyntaxError {
    pub kind: ObjectKind,
    pub name: String,
    pub violations: Vec<Violation>,
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.field, v.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A create whose name or references do not fit the current namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ObjectKind, name: String },
    #[error("{field} references unknown object '{value}'")]
    Unresolved { field: &'static str, value: String },
}

/// A single device interaction that failed. Recorded, never fatal.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{kind} '{name}' not found in {location}")]
    NotFound {
        location: String,
        kind: ObjectKind,
        name: String,
    },
    #[error("device rejected '{name}': {reason}")]
    Rejected { name: String, reason: String },
    #[error("{0} lock is held")]
    Locked(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("configuration path error: {0}")]
    Xml(#[from] panos_xml::PathError),
    #[error("failed to persist configuration: {0}")]
    Io(#[from] panos_xml::WriteError),
    #[error(transparent)]
    Decode(#[from] FieldError),
}

/// Which device lock an infrastructure failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Config,
    Commit,
}

impl std::fmt::Display for LockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LockType::Config => "config",
            LockType::Commit => "commit",
        })
    }
}

/// Failures that end the run.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("failed to open device configuration {path}: {source}")]
    Connect {
        path: PathBuf,
        source: panos_xml::ParseError,
    },
    #[error("no {platform} scope named '{location}'")]
    UnknownLocation {
        platform: crate::scope::Platform,
        location: String,
    },
    #[error("failed to read changeset {path}: {source}")]
    ReadChangeset { path: PathBuf, source: csv::Error },
    #[error("could not acquire {lock} lock: {source}")]
    LockAcquire {
        lock: LockType,
        source: DeviceError,
    },
    #[error("could not release {lock} lock after {attempts} attempts")]
    LockRelease { lock: LockType, attempts: u32 },
    #[error("failed to save configuration to {path}: {source}")]
    Persist { path: PathBuf, source: DeviceError },
}
