//! `parley` terminal chat client.
//!
//! Reads commands and chat input from stdin, prints the open dialog's
//! transcript and any error banner to stdout, logs to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::info;

use parley_client::commands::{self, Reply, HELP};
use parley_client::config::ClientConfig;
use parley_client::render;
use parley_client::state::AppState;
use parley_net::{ApiClient, Backend, ErrorSignal, HttpBackend};
use parley_shared::constants::APP_NAME;
use parley_shared::DialogId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    parley_client::init_tracing();
    info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and build the backend
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(api = %config.api_base_url, "Configuration loaded");

    let signal = ErrorSignal::new();
    let client = ApiClient::new(
        &config.api_base_url,
        config.session_cookie.as_deref(),
        config.request_timeout,
        signal.clone(),
    )?;
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(client));

    let mut state = AppState::new(backend, config.chat_config(), config.error_ttl);
    let errors = spawn_error_printer(&signal);

    // -----------------------------------------------------------------------
    // 3. Identity check
    // -----------------------------------------------------------------------
    match state.start().await {
        Some(session) => {
            println!("Signed in as {}", session.display_name);
            print_lines(&commands::dialogs::summary(&state));
        }
        None => println!("Not signed in. Use /login <token>, or /help."),
    }

    let mut printer: Option<(DialogId, JoinHandle<()>)> = None;
    follow_chat(&state, &mut printer);

    // -----------------------------------------------------------------------
    // 4. Input loop until /quit, EOF or Ctrl+C
    // -----------------------------------------------------------------------
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let result = match commands::parse(&line) {
                    Ok(cmd) => commands::dispatch(&mut state, cmd).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(Reply::Quit) => break,
                    Ok(Reply::Lines(out)) => print_lines(&out),
                    Err(e) => {
                        println!("error: {e}");
                        if matches!(e, commands::CommandError::Unknown(_)) {
                            println!("{HELP}");
                        }
                    }
                }
                follow_chat(&state, &mut printer);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                break;
            }
        }
    }

    if let Some((_, task)) = printer.take() {
        task.abort();
    }
    errors.abort();
    state.logout();
    info!("Bye");
    Ok(())
}

/// Keep exactly one transcript printer, attached to the open chat window.
fn follow_chat(state: &AppState, printer: &mut Option<(DialogId, JoinHandle<()>)>) {
    let open = state.chat.as_ref().map(|c| c.dialog_id());
    if printer.as_ref().map(|(id, _)| *id) == open {
        return;
    }
    if let Some((_, task)) = printer.take() {
        task.abort();
    }
    if let Some(chat) = state.chat.as_ref() {
        *printer = Some((chat.dialog_id(), render::spawn_printer(chat.subscribe())));
    }
}

fn spawn_error_printer(signal: &ErrorSignal) -> JoinHandle<()> {
    let mut rx = signal.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            if let Some(message) = rx.borrow_and_update().as_deref() {
                println!("! {message}  (/dismiss)");
            }
        }
    })
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
