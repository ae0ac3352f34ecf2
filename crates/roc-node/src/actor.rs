//! Single-owner actor around the handover session.
//!
//! Transport messages, timer ticks and operator commands all arrive on one
//! mailbox and are applied to the session strictly one at a time. After each
//! input a fresh snapshot is published for the HTTP layer.

use handover_core::{
    HandoverSession, InboundMessage, SessionSnapshot, TimerId, TimerSource, TransportPort,
};
use roc_common::HandoverError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Local operator decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Ready,
    Abort,
}

/// Reply channel for an operator command
pub type CommandReply = oneshot::Sender<Result<(), HandoverError>>;

/// Everything the session actor consumes
#[derive(Debug)]
pub enum SessionInput {
    Inbound(InboundMessage),
    Tick(TimerId),
    Command(OperatorCommand, CommandReply),
}

pub struct SessionActor<T, S> {
    session: HandoverSession<T, S>,
    inbox: mpsc::Receiver<SessionInput>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<T: TransportPort, S: TimerSource> SessionActor<T, S> {
    pub fn new(
        session: HandoverSession<T, S>,
        inbox: mpsc::Receiver<SessionInput>,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshots, watcher) = watch::channel(session.snapshot());
        let actor = Self {
            session,
            inbox,
            snapshots,
        };
        (actor, watcher)
    }

    /// Process inputs until shutdown, the mailbox closes, or a fatal error
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), HandoverError> {
        tracing::info!(
            vessel = %self.session.vessel_id(),
            gate = %self.session.gate_id(),
            role = ?self.session.role(),
            "🧭 Handover session running"
        );

        let result = loop {
            tokio::select! {
                input = self.inbox.recv() => {
                    let Some(input) = input else {
                        tracing::debug!("Session mailbox closed");
                        break Ok(());
                    };
                    if let Err(e) = self.dispatch(input) {
                        break Err(e);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("🧭 Handover session shutting down");
                    break Ok(());
                }
            }
        };

        self.session.teardown();
        self.snapshots.send_replace(self.session.snapshot());
        result
    }

    fn dispatch(&mut self, input: SessionInput) -> Result<(), HandoverError> {
        let (result, reply) = match input {
            SessionInput::Inbound(message) => (self.session.handle(message), None),
            SessionInput::Tick(timer) => (self.session.on_tick(timer), None),
            SessionInput::Command(command, reply) => {
                let result = match command {
                    OperatorCommand::Ready => self.session.assert_ready(),
                    OperatorCommand::Abort => self.session.assert_abort(),
                };
                (result, Some(reply))
            }
        };

        self.snapshots.send_replace(self.session.snapshot());
        if let Some(reply) = reply {
            // Caller may have given up waiting
            let _ = reply.send(result.clone());
        }

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => {
                tracing::error!(error = %e, "Fatal session error, stopping");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session input failed");
                Ok(())
            }
        }
    }
}
