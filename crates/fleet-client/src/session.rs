//! Interactive session driver.
//!
//! Glues the lifecycle table to the real world: it runs the effects
//! the table returns, owns the transport, and keeps the per-session
//! buffers (pending input line, recall history, scrollback).
//!
//! The driver is single-host and single-use: once the session reaches
//! a terminal state the operator starts over with a fresh one. There
//! is no automatic reconnect.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::mpsc;

use fleet_core::config::SessionLimits;
use fleet_core::{Host, SessionError};
use fleet_protocol::{SessionId, TerminalMessage};

use crate::endpoint::SessionEndpoint;
use crate::history::CommandHistory;
use crate::machine::{transition, Effect, Input, SessionState};
use crate::normalize::OutputNormalizer;
use crate::scrollback::Scrollback;
use crate::transport::{SessionTransport, TransportEvent};

/// What the driver surfaces to whoever is rendering the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A normalized output chunk, ready to print
    Output(String),

    /// The session is over. `clean` is false when the stream dropped
    /// or the remote errored rather than the operator closing it.
    Closed { clean: bool },
}

/// A long-lived interactive terminal session against one host
pub struct InteractiveSession<E: SessionEndpoint> {
    endpoint: Arc<E>,
    host: Host,
    created_at: SystemTime,
    state: SessionState,
    id: Option<SessionId>,
    transport: Option<SessionTransport>,
    normalizer: OutputNormalizer,
    scrollback: Scrollback,
    history: CommandHistory,
    pending: String,
    clean: bool,
    queued: VecDeque<SessionUpdate>,
    observer: Option<mpsc::Sender<SessionUpdate>>,
}

impl<E: SessionEndpoint> InteractiveSession<E> {
    /// Create an idle session for a host
    pub fn new(endpoint: Arc<E>, host: Host, limits: &SessionLimits) -> Self {
        Self {
            endpoint,
            host,
            created_at: SystemTime::now(),
            state: SessionState::Idle,
            id: None,
            transport: None,
            normalizer: OutputNormalizer::new(),
            scrollback: Scrollback::new(limits.scrollback_cap),
            history: CommandHistory::new(limits.history_cap),
            pending: String::new(),
            clean: true,
            queued: VecDeque::new(),
            observer: None,
        }
    }

    /// Create an idle session whose updates are additionally mirrored
    /// to an observer channel.
    ///
    /// Components that are not the driving loop (a status line, a
    /// recorder) subscribe here instead of reaching into the session.
    pub fn with_observer(
        endpoint: Arc<E>,
        host: Host,
        limits: &SessionLimits,
        observer: mpsc::Sender<SessionUpdate>,
    ) -> Self {
        let mut session = Self::new(endpoint, host, limits);
        session.observer = Some(observer);
        session
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The remote session id, once allocated
    pub fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    /// The host this session targets
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// When this session object was created
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Retained output, while the session lives
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    /// Run the create/attach handshake.
    ///
    /// Only valid on a fresh session; a handshake failure is terminal
    /// and the operator starts over with a new session.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted {
                state: self.state.name(),
            });
        }

        self.apply(Input::Connect);
        tracing::info!(host = %self.host.hostname, "opening interactive session");

        match self.open_stream().await {
            Ok((id, transport)) => {
                tracing::info!(host = %self.host.hostname, session = %id.short(), "session streaming");
                self.id = Some(id);
                self.transport = Some(transport);
                self.apply(Input::StreamOpened);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(host = %self.host.hostname, error = %e, "session handshake failed");
                self.apply(Input::ConnectFailed);
                Err(e)
            }
        }
    }

    async fn open_stream(&mut self) -> Result<(SessionId, SessionTransport), SessionError> {
        let id = self.endpoint.create_session(&self.host).await?;

        match self.endpoint.open_stream(&id).await {
            Ok(transport) => Ok((id, transport)),
            Err(e) => {
                // The session exists remotely but we could not attach;
                // release it so it does not leak.
                if let Err(close_err) = self.endpoint.close_session(&id).await {
                    tracing::warn!(session = %id.short(), error = %close_err,
                        "failed to release session after attach failure");
                }
                Err(e.into())
            }
        }
    }

    /// Submit a command line to the remote shell.
    ///
    /// The line is recorded in recall history and sent with a trailing
    /// newline. Rejected unless the session is streaming.
    pub async fn submit(&mut self, line: &str) -> Result<(), SessionError> {
        if self.state != SessionState::Streaming {
            return Err(SessionError::NotStreaming {
                state: self.state.name(),
            });
        }

        self.history.push(line);
        let effects = self.apply(Input::Submit);
        if effects.contains(&Effect::SendInput) {
            if let Some(transport) = &self.transport {
                let send = transport
                    .send(TerminalMessage::Input {
                        data: format!("{}\n", line),
                    })
                    .await;
                if let Err(e) = send {
                    tracing::warn!(host = %self.host.hostname, error = %e, "input delivery failed");
                    let effects = self.apply(Input::SendFailed);
                    self.run_effects(effects).await;
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Submit the pending input line, clearing it.
    ///
    /// On failure the line is left in place so the operator does not
    /// lose what they typed.
    pub async fn submit_pending(&mut self) -> Result<String, SessionError> {
        let line = std::mem::take(&mut self.pending);
        if let Err(e) = self.submit(&line).await {
            self.pending = line;
            return Err(e);
        }
        Ok(line)
    }

    /// The in-progress input line
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Replace the in-progress input line
    pub fn set_pending(&mut self, line: impl Into<String>) {
        self.pending = line.into();
    }

    /// Append a character to the in-progress line
    pub fn push_char(&mut self, ch: char) {
        self.pending.push(ch);
    }

    /// Delete the last character of the in-progress line
    pub fn backspace(&mut self) {
        self.pending.pop();
    }

    /// Recall the previous (older) history entry into the pending line
    pub fn recall_up(&mut self) {
        if let Some(entry) = self.history.recall_up(&self.pending) {
            let entry = entry.to_string();
            self.pending = entry;
        }
    }

    /// Recall the next (newer) history entry; past the newest entry
    /// the stashed in-progress line is restored
    pub fn recall_down(&mut self) {
        if let Some(line) = self.history.recall_down() {
            self.pending = line;
        }
    }

    /// Wait for the next renderable update.
    ///
    /// Returns `None` once the session has delivered its final
    /// `Closed` update (or never streamed at all).
    pub async fn next_event(&mut self) -> Option<SessionUpdate> {
        if let Some(update) = self.queued.pop_front() {
            return Some(update);
        }

        loop {
            let event = match self.transport.as_mut() {
                Some(t) => t.recv().await,
                None => return None,
            };

            match event {
                Some(TransportEvent::Message(TerminalMessage::Output { data })) => {
                    let effects = self.apply(Input::Output);
                    if !effects.contains(&Effect::AppendOutput) {
                        continue;
                    }
                    let chunk = self.normalizer.push_chunk(&data);
                    if chunk.is_empty() {
                        // Pure control sequences; nothing to render
                        continue;
                    }
                    self.scrollback.push(chunk.clone());
                    let update = SessionUpdate::Output(chunk);
                    self.notify(&update);
                    return Some(update);
                }
                Some(TransportEvent::Message(TerminalMessage::Error { data })) => {
                    tracing::warn!(host = %self.host.hostname, error = %data, "remote session error");
                    return Some(self.finish(Input::ErrorMessage).await);
                }
                Some(TransportEvent::Message(TerminalMessage::Input { .. })) => {
                    tracing::debug!("ignoring input envelope from the remote side");
                    continue;
                }
                Some(TransportEvent::Closed { .. }) | None => {
                    return Some(self.finish(Input::TransportClosed).await);
                }
            }
        }
    }

    /// Close the session.
    ///
    /// Safe to call in any state and any number of times; teardown is
    /// issued at most once, and a teardown failure is logged rather
    /// than surfaced. An unterminated output tail is emitted as a
    /// final `Output` update before the `Closed` one.
    pub async fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        let effects = self.apply(Input::Close);
        let tail = self.run_effects(effects).await;
        self.apply(Input::CloseDone);

        if !tail.is_empty() {
            let output = SessionUpdate::Output(tail);
            self.notify(&output);
            self.queued.push_back(output);
        }
        let closed = SessionUpdate::Closed { clean: self.clean };
        self.notify(&closed);
        self.queued.push_back(closed);
        tracing::info!(host = %self.host.hostname, "session closed");
    }

    /// Mirror an update to the observer, if one is attached. Delivery
    /// is best effort; a slow observer never stalls the session.
    fn notify(&self, update: &SessionUpdate) {
        if let Some(observer) = &self.observer {
            if let Err(e) = observer.try_send(update.clone()) {
                tracing::debug!(error = %e, "observer did not take session update");
            }
        }
    }

    fn apply(&mut self, input: Input) -> &'static [Effect] {
        let (next, effects) = transition(self.state, input);
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, "session state change");
            self.state = next;
        }
        effects
    }

    /// Drive a stream-ending input through the table and build the
    /// final update, emitting a flushed tail first if there is one.
    async fn finish(&mut self, input: Input) -> SessionUpdate {
        let effects = self.apply(input);
        let tail = self.run_effects(effects).await;

        let closed = SessionUpdate::Closed { clean: self.clean };
        if tail.is_empty() {
            self.notify(&closed);
            closed
        } else {
            // The tail is rendered before the close lands
            let output = SessionUpdate::Output(tail);
            self.notify(&output);
            self.notify(&closed);
            self.queued.push_back(closed);
            output
        }
    }

    /// Execute table effects. Returns the normalizer tail recovered by
    /// a flush, if any.
    async fn run_effects(&mut self, effects: &'static [Effect]) -> String {
        let mut tail = String::new();

        for effect in effects {
            match effect {
                Effect::MarkUnclean => self.clean = false,
                Effect::Teardown => {
                    if let Some(id) = &self.id {
                        if let Err(e) = self.endpoint.close_session(id).await {
                            tracing::warn!(session = %id.short(), error = %e, "session teardown failed");
                        }
                    }
                }
                Effect::FlushAndClear => {
                    tail = self.normalizer.flush();
                    self.scrollback.clear();
                    if let Some(transport) = self.transport.take() {
                        transport.shutdown().await;
                    }
                }
                // Driven directly by connect/submit/next_event
                Effect::OpenStream | Effect::SendInput | Effect::AppendOutput => {}
            }
        }

        tail
    }
}
