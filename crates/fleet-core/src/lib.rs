//! fleet-core: Domain types and configuration for fleetops
//!
//! This crate holds the pieces shared by the client library and the
//! CLI: the host registry, the dispatch result model, the selection
//! set, the error taxonomy, and the TOML configuration layer.

pub mod config;
pub mod error;
pub mod registry;
pub mod selection;
pub mod types;

pub use config::FleetConfig;
pub use error::{DispatchError, FleetError, HostError, SessionError, TransportError};
pub use registry::{HostRegistry, StaticRegistry};
pub use selection::SelectionSet;
pub use types::{DispatchOutcome, DispatchResult, Host, Hostname};
