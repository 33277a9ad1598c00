//! Connect command implementation

use std::io::{stdout, Stdout, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveToColumn,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    ExecutableCommand,
};
use tokio::sync::mpsc;

use fleet_client::{GatewayClient, InteractiveSession, SessionEndpoint, SessionUpdate};
use fleet_core::config::FleetConfig;
use fleet_core::{HostRegistry, Hostname, StaticRegistry};

use crate::output::{print_info, print_success, print_warning};

/// Execute the connect command - open an interactive session and
/// drive it until it closes
pub async fn connect_command(config: &FleetConfig, host: &str) -> Result<()> {
    let registry = StaticRegistry::new(config.hosts.clone());
    let host = registry
        .resolve(&Hostname::new(host))
        .with_context(|| format!("Unknown host: {}", host))?;

    print_info(&format!("Opening session on '{}'...", host.hostname));

    let endpoint = Arc::new(GatewayClient::new(&config.gateway));
    let mut session = InteractiveSession::new(endpoint, host, &config.session);
    session.connect().await.context("Failed to open session")?;

    let short = session.id().map(|id| id.short().to_string());
    print_success(&format!(
        "Session {} open. Press Ctrl+] to close.",
        short.as_deref().unwrap_or("?")
    ));

    let clean = run_terminal(&mut session).await?;
    if clean {
        print_success("Session closed");
    } else {
        print_warning("Session closed by the remote side");
    }

    Ok(())
}

/// Raw-mode terminal loop. Returns whether the session ended cleanly.
async fn run_terminal<E: SessionEndpoint>(session: &mut InteractiveSession<E>) -> Result<bool> {
    enable_raw_mode()?;
    let result = terminal_loop(session).await;
    disable_raw_mode()?;
    println!();
    result
}

async fn terminal_loop<E: SessionEndpoint>(session: &mut InteractiveSession<E>) -> Result<bool> {
    let mut stdout = stdout();

    // Keyboard events come from a blocking poller; crossterm's reader
    // cannot be awaited directly.
    let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);
    let event_handle = tokio::task::spawn_blocking(move || poll_key_events(event_tx));

    draw_prompt(&mut stdout, session.pending())?;
    let mut clean = true;

    loop {
        tokio::select! {
            Some(evt) = event_rx.recv() => {
                if let Event::Key(KeyEvent { code, modifiers, .. }) = evt {
                    // Ctrl+] closes the session
                    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char(']') {
                        session.close().await;
                        break;
                    }

                    match code {
                        KeyCode::Enter => {
                            stdout.execute(Print("\r\n"))?;
                            if let Err(e) = session.submit_pending().await {
                                tracing::warn!(error = %e, "submit failed");
                                clean = false;
                                break;
                            }
                        }
                        KeyCode::Up => session.recall_up(),
                        KeyCode::Down => session.recall_down(),
                        KeyCode::Backspace => session.backspace(),
                        KeyCode::Char(c) => session.push_char(c),
                        _ => {}
                    }
                    draw_prompt(&mut stdout, session.pending())?;
                }
            }

            update = session.next_event() => {
                match update {
                    Some(SessionUpdate::Output(chunk)) => {
                        // Overwrite the prompt line, print the chunk
                        // (remote PTY output is already CRLF), redraw
                        stdout.execute(MoveToColumn(0))?;
                        stdout.execute(Clear(ClearType::CurrentLine))?;
                        stdout.write_all(chunk.as_bytes())?;
                        stdout.flush()?;
                        draw_prompt(&mut stdout, session.pending())?;
                    }
                    Some(SessionUpdate::Closed { clean: was_clean }) => {
                        clean = was_clean;
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Dropping the receiver is what stops the poller; join it so no
    // background polling outlives the loop.
    drop(event_rx);
    let _ = event_handle.await;
    Ok(clean)
}

/// Blocking keyboard poller feeding the terminal loop.
///
/// Exits once the receiving side is gone (or the terminal cannot be
/// polled), checked on every tick.
fn poll_key_events(event_tx: mpsc::Sender<Event>) {
    while !event_tx.is_closed() {
        match event::poll(std::time::Duration::from_millis(10)) {
            Ok(true) => {
                if let Ok(evt) = event::read() {
                    if event_tx.blocking_send(evt).is_err() {
                        break;
                    }
                }
            }
            Ok(false) => {}
            Err(_) => break,
        }
    }
}

fn draw_prompt(stdout: &mut Stdout, pending: &str) -> Result<()> {
    stdout.execute(MoveToColumn(0))?;
    stdout.execute(Clear(ClearType::CurrentLine))?;
    stdout.execute(Print(format!("> {}", pending)))?;
    stdout.flush()?;
    Ok(())
}
