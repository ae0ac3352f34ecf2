//! Capabilities the session depends on but does not implement.
//!
//! The runner supplies both:
//! - Production: Redis pub/sub publisher and tokio interval tasks
//! - Tests: recording doubles driven by hand

use roc_common::HandoverError;
use std::time::Duration;

use crate::message::OutboundMessage;

/// Timers owned by a handover session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Re-checks the agreement predicate while the vessel request is latched
    VesselPoll,
    /// Drives the receiver's repeating takeover notice
    Takeover,
}

/// Outbound half of the pub/sub transport.
pub trait TransportPort {
    /// Hand a message to the transport without waiting for delivery.
    ///
    /// Fails with [`HandoverError::TransportNotReady`] until the underlying
    /// connection is established.
    fn publish(&mut self, message: OutboundMessage) -> Result<(), HandoverError>;
}

/// Source of periodic tick notifications.
///
/// A started timer delivers `TimerId` ticks back into the session's input
/// stream every `period`, first tick one period after the start.
pub trait TimerSource {
    /// Start (or restart) a repeating timer.
    fn start(&mut self, timer: TimerId, period: Duration);

    /// Cancel a timer. Cancelling an inactive timer is a no-op.
    fn cancel(&mut self, timer: TimerId);
}
