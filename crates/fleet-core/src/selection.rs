//! Target selection for batch dispatch
//!
//! Tracks which hosts the operator has checked. Insertion order is
//! significant: dispatch results come back in selection order, so the
//! set preserves it. Dispatch consumes an immutable snapshot taken at
//! call time; the live set may keep changing underneath.

use crate::types::Hostname;

/// Ordered, deduplicated set of dispatch targets
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    hosts: Vec<Hostname>,
}

impl SelectionSet {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host; re-adding an already selected host is a no-op
    pub fn add(&mut self, hostname: Hostname) {
        if !self.hosts.contains(&hostname) {
            self.hosts.push(hostname);
        }
    }

    /// Remove a host if selected
    pub fn remove(&mut self, hostname: &Hostname) {
        self.hosts.retain(|h| h != hostname);
    }

    /// Replace the selection with a snapshot of the full host list
    /// taken at call time
    pub fn select_all<I>(&mut self, hosts: I)
    where
        I: IntoIterator<Item = Hostname>,
    {
        self.hosts.clear();
        for host in hosts {
            self.add(host);
        }
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    /// Immutable snapshot of the current selection, in selection order
    pub fn snapshot(&self) -> Vec<Hostname> {
        self.hosts.clone()
    }

    /// Number of selected hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
