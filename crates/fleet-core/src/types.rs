//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HostError;

/// Unique name of a managed host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(pub String);

impl Hostname {
    /// Create a new hostname
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Hostname {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Hostname {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A managed host as known to the registry.
///
/// Read-only to this crate's consumers; the registry owns the fleet
/// inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Unique hostname
    pub hostname: Hostname,
    /// Address the gateway reaches the host at
    pub ip: String,
    /// Remote user the gateway runs commands as
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    "root".to_string()
}

impl Host {
    /// Create a new host entry
    pub fn new(hostname: impl Into<Hostname>, ip: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.into(),
            user: user.into(),
        }
    }
}

/// How one host's branch of a dispatch settled.
///
/// Timeout is its own variant rather than a flavor of failure text:
/// how a timed-out host is rendered is the caller's policy, not a
/// protocol guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Command ran; captured output attached
    Success { output: String },

    /// This host's invocation failed; siblings are unaffected
    Failed { error: String },

    /// No response before the dispatch deadline
    TimedOut,
}

impl DispatchOutcome {
    /// Build a failed outcome from a host error
    pub fn failed(err: HostError) -> Self {
        Self::Failed {
            error: err.to_string(),
        }
    }
}

/// One targeted host's result; a dispatch yields exactly one of these
/// per host, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// The targeted host
    pub hostname: Hostname,
    /// How this branch settled
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
}

impl DispatchResult {
    /// Whether this host's command succeeded
    pub fn success(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Success { .. })
    }

    /// Output or error text for rendering
    pub fn text(&self) -> &str {
        match &self.outcome {
            DispatchOutcome::Success { output } => output,
            DispatchOutcome::Failed { error } => error,
            DispatchOutcome::TimedOut => "timeout",
        }
    }
}
