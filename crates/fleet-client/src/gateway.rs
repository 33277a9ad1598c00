//! TCP client for the fleet gateway.
//!
//! The gateway speaks newline-delimited JSON. Control traffic
//! (create/close/execute) is request/response on a fresh connection;
//! an `Attach` request upgrades its connection into a bidirectional
//! terminal stream, which is handed to [`SessionTransport`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, FramedParts};

use fleet_core::config::GatewayConfig;
use fleet_core::{Host, HostError, HostRegistry, Hostname, SessionError, TransportError};
use fleet_protocol::{EnvelopeCodec, GatewayRequest, GatewayResponse, SessionId, TerminalMessage};

use crate::dispatch::CommandRunner;
use crate::endpoint::SessionEndpoint;
use crate::transport::SessionTransport;

type ControlStream = Framed<TcpStream, EnvelopeCodec<GatewayRequest, GatewayResponse>>;

/// Client for one gateway address
#[derive(Debug, Clone)]
pub struct GatewayClient {
    address: String,
    connect_timeout: Duration,
}

impl GatewayClient {
    /// Build a client from gateway settings
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            address: config.address.clone(),
            connect_timeout: config.connect_timeout,
        }
    }

    /// The gateway address this client dials
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<ControlStream, TransportError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                TransportError::ConnectionRefused(format!(
                    "connect to {} timed out",
                    self.address
                ))
            })?
            .map_err(|e| TransportError::ConnectionRefused(format!("{}: {}", self.address, e)))?;

        Ok(Framed::new(stream, EnvelopeCodec::new()))
    }

    async fn request(
        stream: &mut ControlStream,
        request: GatewayRequest,
    ) -> Result<GatewayResponse, TransportError> {
        stream.send(request).await?;

        match stream.next().await {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(e.into()),
            None => Err(TransportError::ConnectionLost(
                "gateway closed the connection".to_string(),
            )),
        }
    }

    /// One round trip on a fresh connection
    async fn call(&self, request: GatewayRequest) -> Result<GatewayResponse, TransportError> {
        let mut stream = self.connect().await?;
        Self::request(&mut stream, request).await
    }

    /// Run one command on one host via the gateway
    pub async fn execute(&self, host: &Host, command: &str) -> Result<String, HostError> {
        let request = GatewayRequest::Execute {
            hostname: host.hostname.to_string(),
            command: command.to_string(),
        };

        let response = self
            .call(request)
            .await
            .map_err(|e| HostError::Unreachable(e.to_string()))?;

        match response {
            GatewayResponse::ExecuteResult { success: true, output } => Ok(output),
            GatewayResponse::ExecuteResult { success: false, output } => {
                Err(HostError::Gateway(output))
            }
            GatewayResponse::Error { message } => Err(HostError::Gateway(message)),
            other => Err(HostError::Gateway(format!(
                "unexpected gateway response: {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl SessionEndpoint for GatewayClient {
    async fn create_session(&self, host: &Host) -> Result<SessionId, SessionError> {
        let request = GatewayRequest::CreateSession {
            hostname: host.hostname.to_string(),
            ip_address: host.ip.clone(),
        };

        match self.call(request).await? {
            GatewayResponse::SessionCreated { session_id } => Ok(session_id),
            GatewayResponse::Error { message } => Err(SessionError::CreateFailed(message)),
            other => Err(SessionError::CreateFailed(format!(
                "unexpected gateway response: {:?}",
                other
            ))),
        }
    }

    async fn open_stream(&self, session_id: &SessionId) -> Result<SessionTransport, TransportError> {
        let mut stream = self.connect().await?;
        let response = Self::request(
            &mut stream,
            GatewayRequest::Attach {
                session_id: session_id.clone(),
            },
        )
        .await?;

        match response {
            GatewayResponse::Ok => {
                // The connection now carries terminal envelopes; swap
                // the codec without losing already-buffered bytes.
                let parts = stream.into_parts();
                let mut upgraded =
                    FramedParts::new::<TerminalMessage>(parts.io, EnvelopeCodec::new());
                upgraded.read_buf = parts.read_buf;
                Ok(SessionTransport::open(Framed::from_parts(upgraded)))
            }
            GatewayResponse::Error { message } => Err(TransportError::AttachRejected(message)),
            other => Err(TransportError::AttachRejected(format!(
                "unexpected gateway response: {:?}",
                other
            ))),
        }
    }

    async fn close_session(&self, session_id: &SessionId) -> Result<(), SessionError> {
        let request = GatewayRequest::CloseSession {
            session_id: session_id.clone(),
        };

        match self.call(request).await? {
            GatewayResponse::Ok => Ok(()),
            GatewayResponse::Error { message } => Err(SessionError::TeardownFailed(message)),
            other => Err(SessionError::TeardownFailed(format!(
                "unexpected gateway response: {:?}",
                other
            ))),
        }
    }
}

/// Command runner that resolves hosts through the registry and
/// executes through the gateway.
///
/// Resolution happens per branch at run time: a host that fell off
/// the registry between selection and dispatch settles as a per-host
/// failure instead of sinking the dispatch.
pub struct GatewayCommandRunner {
    client: GatewayClient,
    registry: Arc<dyn HostRegistry>,
}

impl GatewayCommandRunner {
    /// Build a runner over a gateway client and a registry
    pub fn new(client: GatewayClient, registry: Arc<dyn HostRegistry>) -> Self {
        Self { client, registry }
    }
}

#[async_trait]
impl CommandRunner for GatewayCommandRunner {
    async fn run(&self, hostname: &Hostname, command: &str) -> Result<String, HostError> {
        let host = self
            .registry
            .resolve(hostname)
            .ok_or_else(|| HostError::UnknownHost(hostname.to_string()))?;

        self.client.execute(&host, command).await
    }
}
