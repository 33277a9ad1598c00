//! Exec command implementation

use std::sync::Arc;

use anyhow::Result;

use fleet_client::{Dispatcher, GatewayClient, GatewayCommandRunner};
use fleet_core::config::FleetConfig;
use fleet_core::{HostRegistry, Hostname, SelectionSet, StaticRegistry};

use crate::output::{self, print_success, print_warning};

/// Execute the exec command - fan one command out to the selection
pub async fn exec_command(
    config: &FleetConfig,
    command: &str,
    host_args: &[String],
    all: bool,
    json: bool,
) -> Result<()> {
    let registry: Arc<dyn HostRegistry> = Arc::new(StaticRegistry::new(config.hosts.clone()));

    let mut selection = SelectionSet::new();
    if all {
        selection.select_all(registry.list().into_iter().map(|h| h.hostname));
    }
    for name in host_args {
        selection.add(Hostname::new(name.as_str()));
    }

    let runner = GatewayCommandRunner::new(GatewayClient::new(&config.gateway), registry);
    let dispatcher = Dispatcher::new(Arc::new(runner), config.dispatch.clone());

    let targets = selection.snapshot();
    let results = dispatcher.dispatch(command, &targets).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", output::format_results(&results));

    let succeeded = results.iter().filter(|r| r.success()).count();
    let failed = results.len() - succeeded;
    if failed == 0 {
        print_success(&format!("{} host(s) succeeded", succeeded));
    } else {
        print_warning(&format!("{} succeeded, {} failed", succeeded, failed));
    }

    Ok(())
}
