//! End-to-end interactive session tests against an in-memory endpoint.
//!
//! The remote side is a scripted duplex stream speaking real terminal
//! envelopes, so everything from the lifecycle table down to the
//! codec is exercised without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{duplex, DuplexStream};
use tokio_util::codec::Framed;

use fleet_client::{
    InteractiveSession, SessionEndpoint, SessionState, SessionTransport, SessionUpdate,
};
use fleet_core::config::SessionLimits;
use fleet_core::{Host, SessionError, TransportError};
use fleet_protocol::{EnvelopeCodec, SessionId, TerminalMessage};

type RemoteEnd = Framed<DuplexStream, EnvelopeCodec<TerminalMessage>>;

/// Endpoint whose session stream is one half of an in-memory duplex
struct ScriptedEndpoint {
    fail_create: Option<String>,
    stream_slot: Mutex<Option<DuplexStream>>,
    close_calls: AtomicUsize,
}

impl ScriptedEndpoint {
    fn new() -> (Arc<Self>, RemoteEnd) {
        let (near, far) = duplex(4096);
        let endpoint = Arc::new(Self {
            fail_create: None,
            stream_slot: Mutex::new(Some(near)),
            close_calls: AtomicUsize::new(0),
        });
        (endpoint, Framed::new(far, EnvelopeCodec::new()))
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_create: Some(message.to_string()),
            stream_slot: Mutex::new(None),
            close_calls: AtomicUsize::new(0),
        })
    }

    fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionEndpoint for ScriptedEndpoint {
    async fn create_session(&self, _host: &Host) -> Result<SessionId, SessionError> {
        if let Some(message) = &self.fail_create {
            return Err(SessionError::CreateFailed(message.clone()));
        }
        Ok(SessionId::new("sess-0001"))
    }

    async fn open_stream(
        &self,
        _session_id: &SessionId,
    ) -> Result<SessionTransport, TransportError> {
        let stream = self
            .stream_slot
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| TransportError::AttachRejected("no stream scripted".to_string()))?;
        Ok(SessionTransport::open(Framed::new(
            stream,
            EnvelopeCodec::new(),
        )))
    }

    async fn close_session(&self, _session_id: &SessionId) -> Result<(), SessionError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn host() -> Host {
    Host::new("rig-01", "10.0.0.5", "root")
}

fn session(endpoint: Arc<ScriptedEndpoint>) -> InteractiveSession<ScriptedEndpoint> {
    InteractiveSession::new(endpoint, host(), &SessionLimits::default())
}

#[tokio::test]
async fn test_connect_reaches_streaming() {
    let (endpoint, _remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);

    assert_eq!(session.state(), SessionState::Idle);
    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Streaming);
    assert_eq!(session.id().unwrap().as_str(), "sess-0001");
}

#[tokio::test]
async fn test_submit_sends_exactly_one_input_envelope() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);
    session.connect().await.unwrap();

    session.set_pending("ls");
    let sent = session.submit_pending().await.unwrap();
    assert_eq!(sent, "ls");
    assert_eq!(session.pending(), "");

    let envelope = remote.next().await.unwrap().unwrap();
    assert_eq!(
        envelope,
        TerminalMessage::Input {
            data: "ls\n".to_string()
        }
    );
}

#[tokio::test]
async fn test_output_is_normalized_into_scrollback() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);
    session.connect().await.unwrap();

    remote
        .send(TerminalMessage::Output {
            data: "\x1b[32mnotes.txt\x1b[0m\r\n".to_string(),
        })
        .await
        .unwrap();

    match session.next_event().await {
        Some(SessionUpdate::Output(chunk)) => assert_eq!(chunk, "notes.txt\r\n"),
        other => panic!("Unexpected update: {:?}", other),
    }
    assert_eq!(session.scrollback().contents(), "notes.txt\r\n");
}

#[tokio::test]
async fn test_sequence_split_across_envelopes() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);
    session.connect().await.unwrap();

    remote
        .send(TerminalMessage::Output {
            data: "ok\x1b[3".to_string(),
        })
        .await
        .unwrap();
    remote
        .send(TerminalMessage::Output {
            data: "2mgreen\x1b[0m".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Output("ok".to_string()))
    );
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Output("green".to_string()))
    );
}

#[tokio::test]
async fn test_operator_close_is_clean_and_tears_down_once() {
    let (endpoint, _remote) = ScriptedEndpoint::new();
    let mut session = session(Arc::clone(&endpoint));
    session.connect().await.unwrap();

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.scrollback().is_empty());
    assert_eq!(endpoint.close_calls(), 1);

    // Second close is a silent no-op
    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(endpoint.close_calls(), 1);
}

#[tokio::test]
async fn test_remote_drop_closes_unclean_without_teardown() {
    let (endpoint, remote) = ScriptedEndpoint::new();
    let mut session = session(Arc::clone(&endpoint));
    session.connect().await.unwrap();

    drop(remote);

    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Closed { clean: false })
    );
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(endpoint.close_calls(), 0);

    // The stream is gone; nothing more arrives
    assert_eq!(session.next_event().await, None);
}

#[tokio::test]
async fn test_remote_error_envelope_closes_unclean() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);
    session.connect().await.unwrap();

    remote
        .send(TerminalMessage::Error {
            data: "pty allocation failed".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Closed { clean: false })
    );
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_unterminated_tail_is_emitted_before_close() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);
    session.connect().await.unwrap();

    remote
        .send(TerminalMessage::Output {
            data: "partial\x1b[3".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Output("partial".to_string()))
    );

    drop(remote);

    // The buffered tail comes back as literal text, then the close
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Output("\x1b[3".to_string()))
    );
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Closed { clean: false })
    );
}

#[tokio::test]
async fn test_operator_close_flushes_buffered_tail() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let mut session =
        InteractiveSession::with_observer(endpoint, host(), &SessionLimits::default(), tx);
    session.connect().await.unwrap();

    remote
        .send(TerminalMessage::Output {
            data: "partial\x1b[3".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Output("partial".to_string()))
    );

    session.close().await;

    // The buffered tail surfaces as literal text before the close,
    // on the pull side and the observer side alike
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Output("\x1b[3".to_string()))
    );
    assert_eq!(
        session.next_event().await,
        Some(SessionUpdate::Closed { clean: true })
    );
    assert_eq!(session.next_event().await, None);

    assert_eq!(
        rx.recv().await,
        Some(SessionUpdate::Output("partial".to_string()))
    );
    assert_eq!(
        rx.recv().await,
        Some(SessionUpdate::Output("\x1b[3".to_string()))
    );
    assert_eq!(
        rx.recv().await,
        Some(SessionUpdate::Closed { clean: true })
    );
}

#[tokio::test]
async fn test_create_failure_is_terminal() {
    let endpoint = ScriptedEndpoint::failing("host unreachable");
    let mut session = session(Arc::clone(&endpoint));

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::CreateFailed(_)));
    assert_eq!(session.state(), SessionState::Error);

    // No stream was ever attached, so nothing to tear down
    session.close().await;
    assert_eq!(session.state(), SessionState::Error);
    assert_eq!(endpoint.close_calls(), 0);
}

#[tokio::test]
async fn test_submit_rejected_when_not_streaming() {
    let (endpoint, _remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);

    let err = session.submit("uptime").await.unwrap_err();
    assert!(matches!(err, SessionError::NotStreaming { state: "idle" }));
}

#[tokio::test]
async fn test_observer_mirrors_updates() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let mut session =
        InteractiveSession::with_observer(endpoint, host(), &SessionLimits::default(), tx);
    session.connect().await.unwrap();

    remote
        .send(TerminalMessage::Output {
            data: "hello\r\n".to_string(),
        })
        .await
        .unwrap();
    session.next_event().await.unwrap();
    session.close().await;

    assert_eq!(
        rx.recv().await,
        Some(SessionUpdate::Output("hello\r\n".to_string()))
    );
    assert_eq!(
        rx.recv().await,
        Some(SessionUpdate::Closed { clean: true })
    );
}

#[tokio::test]
async fn test_history_recall_round_trip() {
    let (endpoint, mut remote) = ScriptedEndpoint::new();
    let mut session = session(endpoint);
    session.connect().await.unwrap();

    session.set_pending("uptime");
    session.submit_pending().await.unwrap();
    session.set_pending("df -h");
    session.submit_pending().await.unwrap();
    // Drain the two input envelopes
    remote.next().await.unwrap().unwrap();
    remote.next().await.unwrap().unwrap();

    session.set_pending("tai");
    session.recall_up();
    assert_eq!(session.pending(), "df -h");
    session.recall_up();
    assert_eq!(session.pending(), "uptime");
    session.recall_down();
    assert_eq!(session.pending(), "df -h");
    session.recall_down();
    assert_eq!(session.pending(), "tai");
}
