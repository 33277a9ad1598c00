//! Bidirectional envelope transport for an attached session.
//!
//! Owns the framed stream through a reader task and a writer task.
//! All outbound envelopes funnel through one queue, so input written
//! before later output is processed also reaches the wire in that
//! order. Shutdown cancels both tasks and joins them, so no task
//! outlives the transport.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use fleet_core::TransportError;
use fleet_protocol::{EnvelopeCodec, TerminalMessage};

/// Outbound queue depth; a full queue backpressures `send`
const OUTBOUND_DEPTH: usize = 64;

/// Inbound event queue depth
const EVENT_DEPTH: usize = 256;

/// What the reader side surfaces to the session driver
#[derive(Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// An envelope arrived from the remote side
    Message(TerminalMessage),

    /// The stream ended. `clean` is false when the remote dropped the
    /// connection rather than the operator closing it.
    Closed { clean: bool },
}

/// Handle to a live session stream
#[derive(Debug)]
pub struct SessionTransport {
    outbound: mpsc::Sender<TerminalMessage>,
    events: mpsc::Receiver<TransportEvent>,
    cancel: CancellationToken,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SessionTransport {
    /// Take ownership of an attached stream and start pumping it
    pub fn open<S>(framed: Framed<S, EnvelopeCodec<TerminalMessage>>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (mut sink, mut stream) = framed.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<TerminalMessage>(OUTBOUND_DEPTH);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(EVENT_DEPTH);
        let cancel = CancellationToken::new();

        let reader_cancel = cancel.clone();
        let reader = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_cancel.cancelled() => break,
                    frame = stream.next() => match frame {
                        Some(Ok(msg)) => {
                            if event_tx.send(TransportEvent::Message(msg)).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "session stream error");
                            let _ = event_tx.send(TransportEvent::Closed { clean: false }).await;
                            break;
                        }
                        // EOF without an operator close: the remote
                        // side dropped the stream
                        None => {
                            let _ = event_tx.send(TransportEvent::Closed { clean: false }).await;
                            break;
                        }
                    }
                }
            }
        });

        let writer_cancel = cancel.clone();
        let writer = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_cancel.cancelled() => break,
                    msg = outbound_rx.recv() => match msg {
                        Some(msg) => {
                            if let Err(e) = sink.send(msg).await {
                                tracing::warn!(error = %e, "session stream write failed");
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        });

        Self {
            outbound: outbound_tx,
            events: event_rx,
            cancel,
            reader,
            writer,
        }
    }

    /// Queue an envelope for the remote side
    pub async fn send(&self, msg: TerminalMessage) -> Result<(), TransportError> {
        self.outbound
            .send(msg)
            .await
            .map_err(|_| TransportError::ConnectionLost("session stream is gone".to_string()))
    }

    /// Next inbound event; `None` once the reader task is gone
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// Stop both pump tasks and wait for them to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.reader.await;
        let _ = self.writer.await;
    }
}
