//! fleet-client: Session and dispatch machinery for fleetops
//!
//! The pieces the CLI (or any other frontend) drives:
//!
//! - [`Dispatcher`]: concurrent one-shot command fan-out across the
//!   fleet, one result per targeted host.
//! - [`InteractiveSession`]: a long-lived PTY session against a single
//!   host, driven over a bidirectional stream.
//! - [`GatewayClient`]: the TCP client speaking the gateway protocol;
//!   it implements both the session endpoint and the command runner
//!   seams, so everything above it can be tested without a network.
//! - [`MetricsApi`]: thin HTTP client for the fleet metrics API
//!   (health checks, agent installation).

pub mod api;
pub mod dispatch;
pub mod endpoint;
pub mod gateway;
pub mod history;
pub mod machine;
pub mod normalize;
pub mod scrollback;
pub mod session;
pub mod transport;

pub use api::{ApiError, HealthReport, HealthStatus, MetricsApi};
pub use dispatch::{CommandRunner, Dispatcher};
pub use endpoint::SessionEndpoint;
pub use gateway::{GatewayClient, GatewayCommandRunner};
pub use machine::SessionState;
pub use session::{InteractiveSession, SessionUpdate};
pub use transport::{SessionTransport, TransportEvent};
