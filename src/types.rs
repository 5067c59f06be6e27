//! Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two server collections that carry an approval status.
/// Pre-approved appointments and spot-registered visitors share the same
/// approve/disapprove/complete/exit lifecycle under different paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Appointment,
    Visitor,
}

impl EntityKind {
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Appointment => "appointment",
            EntityKind::Visitor => "visitors",
        }
    }
}

/// A server-side record addressed by kind and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn appointment(id: impl ToString) -> Self {
        Self { kind: EntityKind::Appointment, id: id.to_string() }
    }

    pub fn visitor(id: impl ToString) -> Self {
        Self { kind: EntityKind::Visitor, id: id.to_string() }
    }

    /// Path of the record relative to the API base, e.g. `appointment/12`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.collection(), self.id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.collection(), self.id)
    }
}

/// Server record id. Most collections use integers, a few return strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Numeric value used for newest-first ordering; text ids sort last.
    pub fn ordinal(&self) -> i64 {
        match self {
            RecordId::Int(n) => *n,
            RecordId::Text(s) => s.parse().unwrap_or(i64::MIN),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(s.to_string()),
        }
    }
}
