//! Colloquy application binary - composition root.
//!
//! Ties the Colloquy crates into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build a conversation session over a local generation backend
//! 4. Stream replies for prompts read from stdin

mod cli;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;

use colloquy_chat::{ChatError, ChatSession, EchoBackend};
use colloquy_core::{ColloquyConfig, SessionEvent};

use crate::cli::CliArgs;

/// Print streamed assistant content as it arrives.
///
/// Tracks what has already been written so cumulative updates print only
/// their suffix; a retroactive edit rewrites the line.
async fn print_events(session: Arc<ChatSession<EchoBackend>>) {
    let mut events = session.subscribe();
    let mut printed = String::new();

    while let Ok(event) = events.recv().await {
        match event {
            SessionEvent::TurnStarted { .. } => {
                printed.clear();
            }
            SessionEvent::MessageUpdated { content, .. } => {
                if let Some(suffix) = content.strip_prefix(printed.as_str()) {
                    print!("{}", suffix);
                } else {
                    print!("\r{}", content);
                }
                printed = content;
                let _ = std::io::stdout().flush();
            }
            SessionEvent::TurnCompleted { .. } | SessionEvent::TurnFailed { .. } => {
                println!();
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = ColloquyConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Colloquy v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let session = Arc::new(ChatSession::new(EchoBackend::new(), config.chat.clone()));
    tracing::info!(session = %session.id(), "Conversation session ready");

    let printer = tokio::spawn(print_events(Arc::clone(&session)));

    // Prompt loop: one turn at a time until stdin closes.
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    print!("> ");
    let _ = std::io::stdout().flush();
    while let Some(line) = lines.next_line().await? {
        match session.send(&line).await {
            Ok(_) => {}
            Err(ChatError::EmptyMessage) => {}
            Err(e) => tracing::warn!(error = %e, "Turn did not complete"),
        }
        print!("> ");
        let _ = std::io::stdout().flush();
    }

    printer.abort();
    tracing::info!("Stdin closed; shutting down");
    Ok(())
}
