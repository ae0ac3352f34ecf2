//! Port doubles for driving a session by hand in tests.

use roc_common::HandoverError;
use std::collections::HashMap;
use std::time::Duration;

use crate::message::OutboundMessage;
use crate::ports::{TimerId, TimerSource, TransportPort};

/// Transport that records every accepted message
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub connected: bool,
    pub sent: Vec<OutboundMessage>,
}

impl RecordingTransport {
    pub fn connected() -> Self {
        Self {
            connected: true,
            sent: Vec::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl TransportPort for RecordingTransport {
    fn publish(&mut self, message: OutboundMessage) -> Result<(), HandoverError> {
        if !self.connected {
            return Err(HandoverError::TransportNotReady("test transport offline".into()));
        }
        self.sent.push(message);
        Ok(())
    }
}

/// Timer source that only remembers which timers are running
#[derive(Debug, Default)]
pub struct ManualTimers {
    pub active: HashMap<TimerId, Duration>,
}

impl ManualTimers {
    pub fn is_active(&self, timer: TimerId) -> bool {
        self.active.contains_key(&timer)
    }

    pub fn period(&self, timer: TimerId) -> Option<Duration> {
        self.active.get(&timer).copied()
    }
}

impl TimerSource for ManualTimers {
    fn start(&mut self, timer: TimerId, period: Duration) {
        self.active.insert(timer, period);
    }

    fn cancel(&mut self, timer: TimerId) {
        self.active.remove(&timer);
    }
}
