//! Message types for the fleetops gateway protocol
//!
//! Two message families travel over the same newline-delimited JSON
//! framing:
//!
//! - [`GatewayRequest`] / [`GatewayResponse`]: request/response pairs
//!   for session lifecycle and per-host command execution.
//! - [`TerminalMessage`]: the bidirectional envelope carried by an
//!   attached session stream.
//!
//! # Message Flow
//!
//! Typical sequence for an interactive session:
//!
//! 1. Client sends `CreateSession`, gateway responds `SessionCreated`
//! 2. Client opens a second connection and sends `Attach`
//! 3. Gateway responds `Ok`; the connection now carries
//!    `TerminalMessage` envelopes both ways
//! 4. An `Error` envelope (or the stream dropping) ends the session's
//!    useful lifetime
//! 5. Client sends `CloseSession` on a control connection; the call is
//!    idempotent
//!
//! Batch execution is one `Execute` request per target host.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Unit of exchange over an attached session stream.
///
/// `data` is raw text: input carries the submitted line including its
/// trailing line terminator; output carries remote bytes that may
/// contain terminal control sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalMessage {
    /// Operator input, sent verbatim to the remote shell
    Input { data: String },

    /// Remote output, possibly containing control sequences
    Output { data: String },

    /// Remote-side failure; ends the stream's useful lifetime
    Error { data: String },
}

impl TerminalMessage {
    /// The text payload, regardless of direction
    pub fn data(&self) -> &str {
        match self {
            TerminalMessage::Input { data }
            | TerminalMessage::Output { data }
            | TerminalMessage::Error { data } => data,
        }
    }
}

/// Request from operator tooling to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayRequest {
    /// Allocate a PTY session on a host
    CreateSession {
        hostname: String,
        ip_address: String,
    },

    /// Bind this connection to a session's bidirectional stream
    Attach { session_id: SessionId },

    /// Tear down a session; idempotent
    CloseSession { session_id: SessionId },

    /// Run one shell command on one host
    Execute { hostname: String, command: String },
}

/// Response from the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayResponse {
    /// Session allocated
    SessionCreated { session_id: SessionId },

    /// Result of a single `Execute` request
    ExecuteResult { success: bool, output: String },

    /// Generic success
    Ok,

    /// Error response
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_message_wire_shape() {
        let msg = TerminalMessage::Input {
            data: "ls\n".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"input","data":"ls\n"}"#);

        let decoded: TerminalMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_terminal_message_output_roundtrip() {
        let msg = TerminalMessage::Output {
            data: "\x1b[32mok\x1b[0m\r\n".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();
        let decoded: TerminalMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_request_serialization() {
        let req = GatewayRequest::CreateSession {
            hostname: "rig-01".to_string(),
            ip_address: "10.0.0.5".to_string(),
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("create_session"));
        assert!(json.contains("ip_address"));

        let decoded: GatewayRequest = serde_json::from_str(&json).unwrap();
        match decoded {
            GatewayRequest::CreateSession {
                hostname,
                ip_address,
            } => {
                assert_eq!(hostname, "rig-01");
                assert_eq!(ip_address, "10.0.0.5");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_response_serialization() {
        let resp = GatewayResponse::ExecuteResult {
            success: false,
            output: "ssh: connect refused".to_string(),
        };

        let json = serde_json::to_string(&resp).unwrap();
        let decoded: GatewayResponse = serde_json::from_str(&json).unwrap();

        match decoded {
            GatewayResponse::ExecuteResult { success, output } => {
                assert!(!success);
                assert!(output.contains("refused"));
            }
            _ => panic!("Wrong variant"),
        }
    }
}
