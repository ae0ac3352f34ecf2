//! # Handover Core
//!
//! Coordination state machine for handing a remotely operated vessel over
//! between two Remote Operations Centers at a safety gate.
//!
//! ## Architecture
//! ```text
//! Transport ──InboundMessage──┐
//!                             ├──▶ HandoverSession::handle / on_tick ──▶ TransportPort::publish
//! TimerSource ──TimerId tick──┘          │                           └─▶ TimerSource::start / cancel
//!                                        └── ReadinessRegister
//! ```
//!
//! The session is synchronous and performs no I/O of its own. A single actor
//! owns it and feeds it messages and ticks one at a time.

mod message;
mod ports;
mod register;
mod session;

pub use message::{InboundMessage, OutboundMessage};
pub use ports::{TimerId, TimerSource, TransportPort};
pub use register::{ReadinessRegister, ReadinessUpdate};
pub use session::{HandoverSession, SessionConfig, SessionSnapshot};

#[cfg(test)]
pub(crate) mod testing;
