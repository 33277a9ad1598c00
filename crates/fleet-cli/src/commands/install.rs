//! Install command implementation

use std::path::Path;

use anyhow::{Context, Result};

use fleet_client::MetricsApi;
use fleet_core::config::{self, FleetConfig};
use fleet_core::{Host, Hostname};

use crate::output::{print_info, print_success, print_warning};

/// Execute the install command - put the fleet agent on a machine and
/// optionally record it in the inventory
pub async fn install_command(
    config: &FleetConfig,
    config_path: &Path,
    ip: &str,
    user: &str,
    password: &str,
    hostname: Option<&str>,
) -> Result<()> {
    let api = MetricsApi::new(&config.api);

    print_info(&format!("Installing fleet agent on {}...", ip));
    let installer_output = api
        .install(ip, user, password)
        .await
        .context("Installation failed")?;

    if !installer_output.trim().is_empty() {
        println!("{}", installer_output.trim());
    }
    print_success("Agent installed");

    if let Some(name) = hostname {
        let hostname = Hostname::new(name);
        if config.hosts.iter().any(|h| h.hostname == hostname) {
            print_warning(&format!("Host '{}' is already in the inventory", name));
            return Ok(());
        }

        let mut updated = config.clone();
        updated.hosts.push(Host::new(hostname, ip, user));
        config::save_config(config_path, &updated).context("Failed to update the inventory")?;
        print_success(&format!("Added '{}' to the inventory", name));
    }

    Ok(())
}
