//! Shared constants for ROC handover components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default HTTP listen address for the status surface
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Default safety gate identifier
pub const DEFAULT_GATE_ID: &str = "safety-gate-1";

/// Default vessel identifier
pub const DEFAULT_VESSEL_ID: &str = "MASS_0";

/// Default originally responsible ROC
pub const DEFAULT_ORIGINATOR_ID: &str = "ROC_1";

/// Default receiving ROC
pub const DEFAULT_RECEIVER_ID: &str = "ROC_2";

/// Re-check period for the agreement predicate once the vessel has requested handover
pub const VESSEL_POLL_INTERVAL_MS: u64 = 1000;

/// Period of the receiver's repeating takeover notice
pub const TAKEOVER_INTERVAL_MS: u64 = 1000;

/// First delay before reconnecting to Redis after a lost connection
pub const RECONNECT_BACKOFF_MIN_MS: u64 = 500;

/// Upper bound for the doubling reconnect delay
pub const RECONNECT_BACKOFF_MAX_MS: u64 = 30_000;

/// Session mailbox capacity
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Readiness assertion tokens
pub mod tokens {
    /// Party is ready to hand over / take over
    pub const READY: &str = "READY";

    /// Party aborts the handover
    pub const ABORT: &str = "ABORT";
}

/// Markers searched for in vessel payloads
pub mod markers {
    /// Vessel request payload marker
    pub const READY_FOR_HANDOVER: &str = "READY_FOR_HANDOVER";

    /// Vessel state payload marker
    pub const HANDOVER_COMPLETED: &str = "HANDOVER_COMPLETED";

    /// Prefix naming the controlling ROC in a state payload: new_priority={roc_id}
    pub const NEW_PRIORITY_PREFIX: &str = "new_priority=";
}

/// Pub/sub channel segments
pub mod channels {
    /// Root segment under the vessel: {vessel}/handover/...
    pub const HANDOVER_ROOT: &str = "handover";

    /// Readiness: {vessel}/handover/{gate}/readiness/{party}
    pub const READINESS: &str = "readiness";

    /// One-shot relinquish notice
    pub const RELINQUISH: &str = "relinquish";

    /// Repeating takeover notice
    pub const TAKEOVER: &str = "takeover";

    /// Vessel handover request
    pub const REQUEST: &str = "request";

    /// Vessel handover state
    pub const STATE: &str = "state";

    /// Seconds until the safety gate
    pub const REMOTE_TIME: &str = "remote_time";
}
