//! Output formatting utilities for the CLI
//!
//! Tables for dispatch results and the host inventory, plus colored
//! status messages.

use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

use fleet_client::HealthStatus;
use fleet_core::{DispatchOutcome, DispatchResult, Host};

/// Format dispatch results as an ASCII table, one row per targeted
/// host in dispatch order
pub fn format_results(results: &[DispatchResult]) -> String {
    if results.is_empty() {
        return "No results".to_string();
    }

    #[derive(Tabled)]
    struct ResultRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "STATUS")]
        status: &'static str,
        #[tabled(rename = "OUTPUT")]
        output: String,
    }

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|r| ResultRow {
            host: r.hostname.to_string(),
            status: match r.outcome {
                DispatchOutcome::Success { .. } => "ok",
                DispatchOutcome::Failed { .. } => "failed",
                DispatchOutcome::TimedOut => "timeout",
            },
            output: r.text().trim_end().to_string(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Width::wrap(100))
        .to_string()
}

/// Format the inventory as an ASCII table
pub fn format_hosts(hosts: &[Host]) -> String {
    if hosts.is_empty() {
        return "No hosts in the inventory".to_string();
    }

    #[derive(Tabled)]
    struct HostRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "IP")]
        ip: String,
        #[tabled(rename = "USER")]
        user: String,
    }

    let rows: Vec<HostRow> = hosts
        .iter()
        .map(|h| HostRow {
            host: h.hostname.to_string(),
            ip: h.ip.clone(),
            user: h.user.clone(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format the inventory with a health column; `None` means the check
/// itself failed
pub fn format_hosts_with_health(rows: &[(Host, Option<HealthStatus>)]) -> String {
    if rows.is_empty() {
        return "No hosts in the inventory".to_string();
    }

    #[derive(Tabled)]
    struct HealthRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "IP")]
        ip: String,
        #[tabled(rename = "USER")]
        user: String,
        #[tabled(rename = "STATUS")]
        status: &'static str,
    }

    let table_rows: Vec<HealthRow> = rows
        .iter()
        .map(|(h, status)| HealthRow {
            host: h.hostname.to_string(),
            ip: h.ip.clone(),
            user: h.user.clone(),
            status: match status {
                Some(s) => s.as_str(),
                None => "unknown",
            },
        })
        .collect();

    Table::new(table_rows).with(Style::rounded()).to_string()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("→ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
