//! Session identifier type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for an interactive terminal session.
///
/// The gateway allocates session ids; clients treat them as opaque
/// text and never parse their contents. An id is unique and immutable
/// for the lifetime of its session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID from its wire representation
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    ///
    /// Ids are opaque text, so the cut backs up to a char boundary
    /// rather than assuming ASCII.
    pub fn short(&self) -> &str {
        let mut end = self.0.len().min(8);
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }
        &self.0[..end]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
