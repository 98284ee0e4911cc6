//! Echo Bot Example
//!
//! Connects over the legacy RTM socket and echoes every `message` event back
//! into the channel it came from. Messages from bots (including this one)
//! are ignored.
//!
//! # Usage
//!
//! ```bash
//! TETHER_CONNECTION__TOKEN=xoxb-... cargo run --package echo-bot
//! cargo run --package echo-bot -- --config ./tether.toml --profile production
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tether::prelude::*;
use tether::core::event::MessageEvent;
use tether::runtime::config::ConfigLoader;
use tether::runtime::logging;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "Echo chat messages back over RTM")]
struct Args {
    /// Configuration file (TOML or YAML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Returns the reply for a message, if it deserves one.
fn echo_reply(msg: &MessageEvent) -> Option<Outgoing> {
    if msg.bot_id.is_some() || msg.subtype.is_some() {
        return None;
    }
    let channel = msg.channel.as_deref()?;
    let text = msg.text.as_deref().filter(|t| !t.trim().is_empty())?;

    let reply = Outgoing::message(channel, text);
    Some(match &msg.thread_ts {
        Some(ts) => reply.in_thread(ts.as_str()),
        None => reply,
    })
}

async fn handle_event(handle: &ClientHandle, event: Event) {
    match event {
        Event::Connected { epoch, session } => {
            let name = session
                .and_then(|s| s.user)
                .and_then(|u| u.name)
                .unwrap_or_default();
            info!(epoch, user = %name, "Echo bot online");
        }
        Event::Platform(PlatformEvent::Message(msg)) => {
            if let Some(reply) = echo_reply(&msg)
                && let Err(e) = handle.send(reply).await
            {
                warn!(error = %e, "Failed to queue echo");
            }
        }
        Event::OutgoingError { id, error } => {
            warn!(id = ?id, error = %error, "Echo was not delivered");
        }
        Event::InvalidAuth { error } => {
            error!(error = %error, "Token rejected");
        }
        _ => {}
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    config.connection.protocol = Protocol::Rtm;

    logging::init_from_config(&config.logging);

    let (client, mut events) = Client::from_config(&config)?;
    let handle = client.handle();
    let task = client.start();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => handle_event(&handle, event).await,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, disconnecting");
                handle.disconnect();
            }
        }
    }

    task.await.context("client task failed")?;
    Ok(())
}
