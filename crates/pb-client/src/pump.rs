//! Websocket pump: owns the socket, forwards inbound text frames to the
//! consumer, drains the outbound queue, and reconnects with capped
//! exponential backoff.
//!
//! The pump is deliberately dumb: it moves strings. Decoding, topic
//! state, and dispatch all live on the consumer side of the channel so
//! the single-threaded engine never crosses a thread boundary.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// What the pump reports back to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpEvent {
    /// Socket (re)established. The consumer replays its subscription.
    Connected,
    /// One inbound text frame.
    Frame(String),
    Disconnected,
}

const RECONNECT_BASE_DELAY_SECS: u64 = 2;
const MAX_RECONNECT_DELAY_SECS: u64 = 60;

fn backoff_delay(attempts: u32) -> Duration {
    let secs = std::cmp::min(
        RECONNECT_BASE_DELAY_SECS.saturating_mul(1 << attempts.min(5)),
        MAX_RECONNECT_DELAY_SECS,
    );
    Duration::from_secs(secs)
}

/// Run the pump until the consumer goes away. Reconnects forever; the
/// server owns all state, so a long outage costs nothing but staleness.
pub async fn run(
    ws_url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<PumpEvent>,
) {
    let mut attempts = 0u32;
    loop {
        match connection(&ws_url, &mut outbound, &events).await {
            Ok(Session::Shutdown) => return,
            Ok(Session::Lost) => attempts = 0,
            Err(err) => {
                attempts += 1;
                log::warn!("websocket: {err:#}");
            }
        }
        if events.send(PumpEvent::Disconnected).is_err() {
            return;
        }
        tokio::time::sleep(backoff_delay(attempts)).await;
    }
}

enum Session {
    /// The consumer closed the outbound queue: stop for good.
    Shutdown,
    /// The server went away after a working session: reconnect.
    Lost,
}

async fn connection(
    ws_url: &str,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    events: &mpsc::UnboundedSender<PumpEvent>,
) -> Result<Session> {
    let (stream, _) = connect_async(ws_url)
        .await
        .with_context(|| format!("connecting to {ws_url}"))?;
    if events.send(PumpEvent::Connected).is_err() {
        return Ok(Session::Shutdown);
    }
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => write
                    .send(Message::Text(text.into()))
                    .await
                    .context("sending control frame")?,
                None => return Ok(Session::Shutdown),
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if events.send(PumpEvent::Frame(text.to_string())).is_err() {
                        return Ok(Session::Shutdown);
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    write.send(Message::Pong(data)).await.context("pong")?;
                }
                Some(Ok(Message::Close(_))) | None => return Ok(Session::Lost),
                Some(Err(err)) => return Err(err).context("reading frame"),
                Some(Ok(_)) => {}
            },
        }
    }
}
