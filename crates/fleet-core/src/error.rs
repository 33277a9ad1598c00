//! Core error types for fleetops

use fleet_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the fleetops ecosystem
#[derive(Error, Debug)]
pub enum FleetError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Dispatch validation error
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pre-flight validation failures for a dispatch request.
///
/// These are rejected before any network call is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Command text is empty or whitespace
    #[error("Command must not be empty")]
    EmptyCommand,

    /// No target hosts selected
    #[error("At least one target host is required")]
    NoHosts,
}

/// A single host's failure during a dispatch.
///
/// Carried inside a dispatch result, never propagated as an error of
/// the dispatch itself; one host failing leaves its siblings
/// untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Host is not present in the registry
    #[error("Unknown host: {0}")]
    UnknownHost(String),

    /// The gateway reported a failure for this host
    #[error("{0}")]
    Gateway(String),

    /// Could not reach the gateway for this host's invocation
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),
}

/// Session-related errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// The remote side could not allocate a session; no stream was
    /// attempted
    #[error("Session create failed: {0}")]
    CreateFailed(String),

    /// Operation requires a streaming session
    #[error("Session is not streaming (state: {state})")]
    NotStreaming { state: &'static str },

    /// connect() is only valid on a fresh session
    #[error("Session already started (state: {state})")]
    AlreadyStarted { state: &'static str },

    /// The gateway refused to tear the session down
    #[error("Session teardown failed: {0}")]
    TeardownFailed(String),

    /// Transport failure while the session was active
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Transport-related errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not connect to the gateway
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The stream dropped while in use
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The gateway rejected the attach request
    #[error("Attach rejected: {0}")]
    AttachRejected(String),

    /// Protocol-level failure on the stream
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
