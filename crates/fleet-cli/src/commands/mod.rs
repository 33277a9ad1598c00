//! CLI command implementations

mod connect;
mod exec;
mod hosts;
mod install;

pub use connect::connect_command;
pub use exec::exec_command;
pub use hosts::hosts_command;
pub use install::install_command;
