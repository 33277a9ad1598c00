//! fleet-protocol: Wire protocol for fleetops gateway communication
//!
//! This crate defines the JSON message types exchanged between the
//! operator tooling and the fleet gateway, and the newline-delimited
//! codec used to frame them over a TCP stream.

pub mod codec;
pub mod error;
pub mod message;
pub mod session;

pub use codec::EnvelopeCodec;
pub use error::ProtocolError;
pub use message::{GatewayRequest, GatewayResponse, TerminalMessage};
pub use session::SessionId;
