//! Common error types for ROC handover components.

use thiserror::Error;

/// Common errors across handover components
#[derive(Debug, Clone, Error)]
pub enum HandoverError {
    /// Handover action invoked while its precondition does not hold
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Party id matches neither party of the session
    #[error("Unknown party: {0}")]
    UnknownParty(String),

    /// Payload could not be interpreted
    #[error("Unrecognized payload: {0}")]
    UnrecognizedPayload(String),

    /// Readiness change refused because the party already aborted
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Local process is only observing this handover
    #[error("Not a participant: {0}")]
    NotAParticipant(String),

    /// Publish attempted before the transport came up
    #[error("Transport not ready: {0}")]
    TransportNotReady(String),

    /// Transport failed after it was established
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandoverError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ProtocolViolation(_) => 500,
            Self::UnknownParty(_) => 404,
            Self::UnrecognizedPayload(_) => 400,
            Self::Conflict(_) => 409,
            Self::NotAParticipant(_) => 403,
            Self::TransportNotReady(_) => 503,
            Self::Transport(_) => 503,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if the session must not keep running after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ProtocolViolation(_))
    }
}
