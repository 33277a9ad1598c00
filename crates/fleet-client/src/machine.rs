//! Interactive session lifecycle as a pure transition table.
//!
//! The table maps (state, input) to (next state, effects). Side
//! effects are returned as data and executed by the session driver,
//! which keeps every lifecycle rule in one testable place.

use std::fmt;

/// Lifecycle states of an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh session, nothing started yet
    Idle,
    /// Create/attach handshake in flight
    Connecting,
    /// Stream attached, input and output flowing
    Streaming,
    /// Operator-initiated teardown in flight
    Closing,
    /// Terminal: stream finished, cleanly or not
    Closed,
    /// Terminal: the handshake failed before a stream existed, or an
    /// input line could not be delivered
    Error,
}

impl SessionState {
    /// Short name for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Streaming => "streaming",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Error => "error",
        }
    }

    /// Whether the session can never leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events fed into the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Operator asked to connect
    Connect,
    /// Create/attach handshake completed
    StreamOpened,
    /// Create/attach handshake failed
    ConnectFailed,
    /// Operator submitted an input line
    Submit,
    /// A submitted line could not be written to the stream
    SendFailed,
    /// An output envelope arrived
    Output,
    /// An error envelope arrived
    ErrorMessage,
    /// The stream dropped without an operator close
    TransportClosed,
    /// Operator asked to close
    Close,
    /// Teardown finished
    CloseDone,
}

/// Side effects the driver must perform for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Run the create/attach handshake
    OpenStream,
    /// Forward the submitted line over the stream
    SendInput,
    /// Normalize and append the arrived chunk to scrollback
    AppendOutput,
    /// Notify the gateway the session is done (best effort)
    Teardown,
    /// Flush the normalizer tail into scrollback, then drop both
    /// scrollback and the stream
    FlushAndClear,
    /// Record that the stream ended without an operator close
    MarkUnclean,
}

/// Compute the successor state and the effects the driver owes.
///
/// Unmatched pairs are no-ops: the state is kept and nothing is done.
/// In particular `Close` on an already terminal session is silently
/// absorbed, which is what makes `close()` idempotent.
pub fn transition(state: SessionState, input: Input) -> (SessionState, &'static [Effect]) {
    use Effect::*;
    use Input::*;
    use SessionState::*;

    match (state, input) {
        (Idle, Connect) => (Connecting, &[OpenStream]),
        (Connecting, StreamOpened) => (Streaming, &[]),
        (Connecting, ConnectFailed) => (Error, &[]),

        (Streaming, Submit) => (Streaming, &[SendInput]),
        (Streaming, Output) => (Streaming, &[AppendOutput]),

        // Input we cannot deliver leaves the session in an unknown
        // remote state; that is a failure, not a close.
        (Streaming, SendFailed) => (Error, &[MarkUnclean, FlushAndClear]),

        // A remote error or a dropped stream ends the session, but it
        // is still a close, not a failure state: the operator sees a
        // closed terminal flagged as unclean.
        (Streaming, ErrorMessage) => (Closed, &[MarkUnclean, FlushAndClear]),
        (Streaming, TransportClosed) => (Closed, &[MarkUnclean, FlushAndClear]),

        (Idle, Close) | (Connecting, Close) | (Streaming, Close) => {
            (Closing, &[Teardown, FlushAndClear])
        }
        (Closing, CloseDone) => (Closed, &[]),

        // Terminal states absorb everything else
        _ => (state, &[]),
    }
}
