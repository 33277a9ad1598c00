//! fleetops: Command-line interface for fleet operations
//!
//! Provides the `fleetops` CLI for running commands across the fleet,
//! opening interactive sessions, inspecting the inventory and
//! installing the agent on new machines.

pub mod commands;
pub mod output;
