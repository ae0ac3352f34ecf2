//! Redis pub/sub transport.
//!
//! Publishing is a non-blocking enqueue onto a publisher task that owns an
//! auto-reconnecting connection manager. A separate subscriber task feeds
//! classified messages into the session mailbox and resubscribes whenever
//! its stream ends. Each task raises its own flag while it is connected.

use anyhow::{Context, Result};
use futures::StreamExt;
use handover_core::{OutboundMessage, TransportPort};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use roc_common::HandoverError;
use roc_common::constants::{RECONNECT_BACKOFF_MAX_MS, RECONNECT_BACKOFF_MIN_MS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use super::ChannelLayout;
use crate::actor::SessionInput;

/// A message queued for the publisher task
#[derive(Debug, Clone)]
pub struct Publication {
    pub channel: String,
    pub payload: String,
}

/// Session-side handle of the Redis publisher
pub struct RedisTransport {
    layout: ChannelLayout,
    outbox: mpsc::UnboundedSender<Publication>,
    connected: Arc<AtomicBool>,
}

impl RedisTransport {
    /// Create the handle and the queue the publisher task drains
    pub fn new(layout: ChannelLayout) -> (Self, mpsc::UnboundedReceiver<Publication>) {
        let (outbox, queue) = mpsc::unbounded_channel();
        let transport = Self {
            layout,
            outbox,
            connected: Arc::new(AtomicBool::new(false)),
        };
        (transport, queue)
    }

    /// Flag raised by the publisher once Redis is reachable
    pub fn connected(&self) -> Arc<AtomicBool> {
        self.connected.clone()
    }
}

impl TransportPort for RedisTransport {
    fn publish(&mut self, message: OutboundMessage) -> Result<(), HandoverError> {
        let (channel, payload) = self.layout.outbound(&message);

        if !self.connected.load(Ordering::Acquire) {
            return Err(HandoverError::TransportNotReady(format!(
                "Redis publisher not connected, cannot publish on {channel}"
            )));
        }

        self.outbox
            .send(Publication { channel, payload })
            .map_err(|_| HandoverError::Transport("Redis publisher task has stopped".into()))
    }
}

/// Drain the outbox into Redis until shutdown.
///
/// The first connection is retried with backoff; after that the connection
/// manager reconnects on its own.
pub async fn run_publisher(
    client: redis::Client,
    mut queue: mpsc::UnboundedReceiver<Publication>,
    connected: Arc<AtomicBool>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut backoff = Duration::from_millis(RECONNECT_BACKOFF_MIN_MS);
    let mut conn = loop {
        let attempt = tokio::select! {
            attempt = ConnectionManager::new(client.clone()) => attempt,
            _ = shutdown.recv() => {
                tracing::info!("📡 Redis publisher shutting down");
                return Ok(());
            }
        };
        match attempt {
            Ok(conn) => break conn,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_in = ?backoff,
                    "Redis publisher cannot connect"
                );
                if !wait_or_shutdown(backoff, &mut shutdown).await {
                    tracing::info!("📡 Redis publisher shutting down");
                    return Ok(());
                }
                backoff = next_backoff(backoff);
            }
        }
    };

    connected.store(true, Ordering::Release);
    tracing::info!("📡 Redis publisher connected");

    loop {
        tokio::select! {
            publication = queue.recv() => {
                let Some(publication) = publication else { break };
                match conn
                    .publish::<_, _, ()>(&publication.channel, &publication.payload)
                    .await
                {
                    Ok(()) => tracing::trace!(
                        channel = %publication.channel,
                        payload = %publication.payload,
                        "Published"
                    ),
                    Err(e) => tracing::warn!(
                        channel = %publication.channel,
                        error = %e,
                        "Failed to publish"
                    ),
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("📡 Redis publisher shutting down");
                break;
            }
        }
    }

    connected.store(false, Ordering::Release);
    Ok(())
}

/// Why a subscription stopped delivering messages
enum SubscriptionEnd {
    StreamClosed,
    MailboxClosed,
}

/// Forward handover messages from Redis into the session mailbox until shutdown.
///
/// A failed or closed subscription is re-established with backoff, and
/// `connected` is lowered while no subscription is live.
pub async fn run_subscriber(
    client: redis::Client,
    layout: ChannelLayout,
    inbox: mpsc::Sender<SessionInput>,
    connected: Arc<AtomicBool>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut backoff = Duration::from_millis(RECONNECT_BACKOFF_MIN_MS);

    loop {
        let outcome = tokio::select! {
            outcome = subscribe_and_forward(&client, &layout, &inbox, &connected) => outcome,
            _ = shutdown.recv() => {
                tracing::info!("👂 Redis subscriber shutting down");
                break;
            }
        };

        if connected.swap(false, Ordering::AcqRel) {
            backoff = Duration::from_millis(RECONNECT_BACKOFF_MIN_MS);
        }
        match outcome {
            Ok(SubscriptionEnd::MailboxClosed) => {
                tracing::debug!("Session mailbox closed");
                break;
            }
            Ok(SubscriptionEnd::StreamClosed) => {
                tracing::warn!(retry_in = ?backoff, "Redis subscription closed, resubscribing");
            }
            Err(e) => {
                tracing::warn!(
                    error = %format!("{e:#}"),
                    retry_in = ?backoff,
                    "Redis subscription failed"
                );
            }
        }

        if !wait_or_shutdown(backoff, &mut shutdown).await {
            tracing::info!("👂 Redis subscriber shutting down");
            break;
        }
        backoff = next_backoff(backoff);
    }

    connected.store(false, Ordering::Release);
    Ok(())
}

async fn subscribe_and_forward(
    client: &redis::Client,
    layout: &ChannelLayout,
    inbox: &mpsc::Sender<SessionInput>,
    connected: &AtomicBool,
) -> Result<SubscriptionEnd> {
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .context("Failed to open Redis subscription")?;

    pubsub
        .psubscribe(layout.readiness_pattern())
        .await
        .context("Failed to subscribe to readiness channels")?;
    for channel in layout.vessel_channels() {
        pubsub
            .subscribe(&channel)
            .await
            .with_context(|| format!("Failed to subscribe to {channel}"))?;
    }

    connected.store(true, Ordering::Release);
    tracing::info!(pattern = %layout.readiness_pattern(), "👂 Redis subscriber started");

    let messages = pubsub.on_message();
    tokio::pin!(messages);
    while let Some(msg) = messages.next().await {
        let channel = msg.get_channel_name().to_string();
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "Undecodable payload");
                continue;
            }
        };

        match layout.inbound(&channel, payload) {
            Some(message) => {
                if inbox.send(SessionInput::Inbound(message)).await.is_err() {
                    return Ok(SubscriptionEnd::MailboxClosed);
                }
            }
            None => tracing::trace!(channel = %channel, "Ignoring unrelated channel"),
        }
    }

    Ok(SubscriptionEnd::StreamClosed)
}

/// Double the reconnect delay up to the configured ceiling
fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(Duration::from_millis(RECONNECT_BACKOFF_MAX_MS))
}

/// Sleep for `delay`; false if shutdown arrived first
async fn wait_or_shutdown(delay: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.recv() => false,
    }
}
