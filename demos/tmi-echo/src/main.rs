//! Echo bot: joins one channel, prints every event as a JSON line, and
//! answers `!echo <text>` with `<text>`.
//!
//! Environment:
//! - `TMI_CHANNEL` (required): channel to join
//! - `TMI_USERNAME` / `TMI_TOKEN`: login; anonymous (read-only) if unset
//! - `TMI_ENDPOINT`: override the server URL
//! - `RUST_LOG`: tracing filter, default `info`

use std::time::Duration;

use serde_json::json;
use tmi::prelude::*;
use tracing_subscriber::EnvFilter;

/// The server probes roughly every five minutes. Twice that without a
/// probe means the connection is dead even if the socket says otherwise.
const STALE_AFTER: Duration = Duration::from_secs(10 * 60);

const ECHO_PREFIX: &str = "!echo ";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let channel = std::env::var("TMI_CHANNEL")
        .map_err(|_| "TMI_CHANNEL must name the channel to join")?;
    let credentials = match (std::env::var("TMI_USERNAME"), std::env::var("TMI_TOKEN")) {
        (Ok(username), Ok(token)) => Credentials::new(username, token),
        _ => Credentials::anonymous(),
    };
    let read_only = credentials.is_anonymous();

    let mut builder = ChatClient::builder();
    if let Ok(endpoint) = std::env::var("TMI_ENDPOINT") {
        builder = builder.endpoint(endpoint);
    }
    let mut events = builder.subscribe();

    tracing::info!(username = credentials.username(), %channel, read_only, "starting echo bot");
    let client = builder.connect(credentials);
    let handle = client.handle();

    // External staleness check over the last-ping timestamp.
    let watchdog = {
        let handle = client.handle();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(30));
            loop {
                tick.tick().await;
                if handle.state() == SessionState::Closed {
                    break;
                }
                if handle.since_last_ping() > STALE_AFTER {
                    tracing::warn!("no PING from server, closing stale connection");
                    handle.close();
                    break;
                }
            }
        })
    };

    while let Some(event) = events.recv().await {
        let line = match &event {
            ChatEvent::Ready => json!({ "event": "ready" }),
            ChatEvent::Message(msg) => json!({ "event": "message", "data": msg }),
            ChatEvent::Notice(notice) => json!({ "event": "notice", "data": notice }),
            ChatEvent::Close => json!({ "event": "close" }),
        };
        println!("{line}");

        match event {
            ChatEvent::Ready => handle.join_channel(&channel)?,
            ChatEvent::Message(msg) if !read_only && !msg.is_whisper() => {
                if let Some(text) = msg.content.strip_prefix(ECHO_PREFIX) {
                    handle.send_message(&msg.channel, text)?;
                }
            }
            ChatEvent::Close => break,
            _ => {}
        }
    }

    watchdog.abort();
    drop(handle);
    client.closed().await?;
    Ok(())
}
