//! Application state shared with the HTTP handlers.

use handover_core::SessionSnapshot;
use roc_common::HandoverError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot, watch};

use crate::actor::{OperatorCommand, SessionInput};
use crate::config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Session actor mailbox
    pub commands: mpsc::Sender<SessionInput>,

    /// Latest session snapshot published by the actor
    pub snapshots: watch::Receiver<SessionSnapshot>,

    /// Raised while the Redis publisher is connected
    pub publisher_connected: Arc<AtomicBool>,

    /// Raised while the Redis subscription is live
    pub subscriber_connected: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        commands: mpsc::Sender<SessionInput>,
        snapshots: watch::Receiver<SessionSnapshot>,
        publisher_connected: Arc<AtomicBool>,
        subscriber_connected: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            commands,
            snapshots,
            publisher_connected,
            subscriber_connected,
        }
    }

    /// Current session snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn publisher_ready(&self) -> bool {
        self.publisher_connected.load(Ordering::Acquire)
    }

    pub fn subscriber_ready(&self) -> bool {
        self.subscriber_connected.load(Ordering::Acquire)
    }

    /// Hand an operator decision to the session and wait for its result
    pub async fn submit(&self, command: OperatorCommand) -> Result<(), HandoverError> {
        let (reply, result) = oneshot::channel();
        self.commands
            .send(SessionInput::Command(command, reply))
            .await
            .map_err(|_| HandoverError::Internal("handover session is not running".into()))?;

        result
            .await
            .map_err(|_| HandoverError::Internal("handover session stopped before replying".into()))?
    }
}
