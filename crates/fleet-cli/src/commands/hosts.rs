//! Hosts command implementation

use anyhow::Result;

use fleet_client::{HealthStatus, MetricsApi};
use fleet_core::config::FleetConfig;
use fleet_core::{Host, HostRegistry, StaticRegistry};

use crate::output::{self, print_warning};

/// Execute the hosts command - list the inventory, optionally with a
/// health column from the metrics API
pub async fn hosts_command(config: &FleetConfig, health: bool) -> Result<()> {
    let registry = StaticRegistry::new(config.hosts.clone());
    let hosts = registry.list();

    if hosts.is_empty() {
        print_warning("No hosts in the inventory");
        return Ok(());
    }

    if !health {
        println!("{}", output::format_hosts(&hosts));
        return Ok(());
    }

    let api = MetricsApi::new(&config.api);
    let checks = hosts.into_iter().map(|host| {
        let api = api.clone();
        async move {
            let status = check_one(&api, &host).await;
            (host, status)
        }
    });
    let rows: Vec<(Host, Option<HealthStatus>)> = futures::future::join_all(checks).await;

    println!("{}", output::format_hosts_with_health(&rows));
    Ok(())
}

async fn check_one(api: &MetricsApi, host: &Host) -> Option<HealthStatus> {
    match api.health(&host.hostname).await {
        Ok(report) => Some(report.status),
        Err(e) => {
            tracing::debug!(host = %host.hostname, error = %e, "health check failed");
            None
        }
    }
}
