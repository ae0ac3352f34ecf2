//! Messages crossing the session boundary.

use roc_common::{PartyId, ReadinessAssertion};

/// A message delivered to the session by the transport adapter.
///
/// Payloads are kept raw; the session decides what they mean.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Readiness assertion published by `sender`
    Readiness { sender: PartyId, payload: String },
    /// Vessel handover request
    VesselRequest { payload: String },
    /// Vessel handover state update
    State { payload: String },
    /// Seconds until the vessel reaches the safety gate
    RemoteTime { payload: String },
}

/// A message the session asks the transport to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Local party's readiness assertion
    Readiness {
        sender: PartyId,
        assertion: ReadinessAssertion,
    },
    /// Originator gives up control (sent once)
    Relinquish { party: PartyId },
    /// Receiver claims control (repeated until completion)
    Takeover { party: PartyId },
}

impl OutboundMessage {
    /// Payload text as published on the wire
    pub fn payload(&self) -> &str {
        match self {
            Self::Readiness { assertion, .. } => assertion.token(),
            Self::Relinquish { party } | Self::Takeover { party } => party.as_str(),
        }
    }
}
