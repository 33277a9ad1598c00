//! Host registry
//!
//! The registry is external to the core subsystem: it resolves a
//! hostname to connection info and enumerates the fleet. The trait is
//! the seam; the static implementation is backed by the `[[hosts]]`
//! table of the config file.

use crate::types::{Host, Hostname};

/// Resolves hostnames to connection info
pub trait HostRegistry: Send + Sync {
    /// Look up a host by name
    fn resolve(&self, hostname: &Hostname) -> Option<Host>;

    /// Enumerate the fleet, in inventory order
    fn list(&self) -> Vec<Host>;
}

/// Registry backed by a fixed inventory loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    hosts: Vec<Host>,
}

impl StaticRegistry {
    /// Build a registry from an inventory
    pub fn new(hosts: Vec<Host>) -> Self {
        Self { hosts }
    }
}

impl HostRegistry for StaticRegistry {
    fn resolve(&self, hostname: &Hostname) -> Option<Host> {
        self.hosts.iter().find(|h| &h.hostname == hostname).cloned()
    }

    fn list(&self) -> Vec<Host> {
        self.hosts.clone()
    }
}
