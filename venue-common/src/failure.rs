//! Failure notifications emitted by the inference gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a failed inference call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Rate limit or usage quota exhausted.
    Quota,
    /// Missing or rejected credential.
    Key,
    /// Anything else.
    Generic,
}

impl FailureKind {
    /// Whether a banner for this kind stays up until the operator acts.
    pub fn is_persistent(&self) -> bool {
        matches!(self, FailureKind::Quota)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Quota => write!(f, "QUOTA"),
            FailureKind::Key => write!(f, "KEY"),
            FailureKind::Generic => write!(f, "GENERIC"),
        }
    }
}

/// A classified failure, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub kind: FailureKind,
    /// Human-readable, displayed verbatim.
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl FailureEvent {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}
