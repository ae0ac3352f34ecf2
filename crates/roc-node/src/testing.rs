//! Test doubles for running the actor without Redis.

use handover_core::{OutboundMessage, TransportPort};
use roc_common::HandoverError;
use tokio::sync::mpsc;

/// Transport that forwards every publish to a channel the test drains
pub struct ChannelTransport {
    sent: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sent, rx) = mpsc::unbounded_channel();
        (Self { sent }, rx)
    }
}

impl TransportPort for ChannelTransport {
    fn publish(&mut self, message: OutboundMessage) -> Result<(), HandoverError> {
        self.sent
            .send(message)
            .map_err(|_| HandoverError::Transport("test receiver dropped".into()))
    }
}
