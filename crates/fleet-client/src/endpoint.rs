//! Session endpoint seam.
//!
//! The interactive session drives its remote side through this trait
//! instead of a concrete gateway connection, so the whole lifecycle is
//! testable against an in-memory endpoint.

use async_trait::async_trait;

use fleet_core::{Host, SessionError, TransportError};
use fleet_protocol::SessionId;

use crate::transport::SessionTransport;

/// Remote side of an interactive session
#[async_trait]
pub trait SessionEndpoint: Send + Sync {
    /// Allocate a PTY session on the host
    async fn create_session(&self, host: &Host) -> Result<SessionId, SessionError>;

    /// Open the bidirectional stream bound to an allocated session
    async fn open_stream(&self, session_id: &SessionId) -> Result<SessionTransport, TransportError>;

    /// Tear the session down; idempotent on the remote side
    async fn close_session(&self, session_id: &SessionId) -> Result<(), SessionError>;
}
