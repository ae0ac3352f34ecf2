//! Pub/sub transport adapter.
//!
//! Implements the session's transport port over Redis pub/sub.

mod channels;
mod pubsub;

pub use channels::{ChannelLayout, check_segment};
pub use pubsub::{RedisTransport, run_publisher, run_subscriber};
