//! Core types shared across ROC handover components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::tokens;
use crate::error::HandoverError;

/// Opaque identity of a Remote Operations Center
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PartyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A party's declared willingness to proceed with the handover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Readiness {
    /// Nothing asserted yet
    #[default]
    Uncertain,
    /// Party asserted READY
    Ready,
    /// Party aborted; sticky for the rest of the session
    Aborted,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uncertain => "UNCERTAIN",
            Self::Ready => "READY",
            Self::Aborted => "ABORTED",
        };
        f.write_str(label)
    }
}

/// Readiness assertion as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadinessAssertion {
    Ready,
    Abort,
}

impl ReadinessAssertion {
    /// Wire token for this assertion
    pub fn token(&self) -> &'static str {
        match self {
            Self::Ready => tokens::READY,
            Self::Abort => tokens::ABORT,
        }
    }

    /// Readiness recorded for a party asserting this
    pub fn readiness(&self) -> Readiness {
        match self {
            Self::Ready => Readiness::Ready,
            Self::Abort => Readiness::Aborted,
        }
    }
}

impl FromStr for ReadinessAssertion {
    type Err = HandoverError;

    /// Parse a raw payload; surrounding whitespace is ignored
    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        match payload.trim() {
            tokens::READY => Ok(Self::Ready),
            tokens::ABORT => Ok(Self::Abort),
            other => Err(HandoverError::UnrecognizedPayload(format!(
                "readiness assertion {other:?}"
            ))),
        }
    }
}

/// Identity and readiness of one ROC in a handover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub readiness: Readiness,
}

impl Party {
    pub fn new(id: PartyId) -> Self {
        Self {
            id,
            readiness: Readiness::Uncertain,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn is_aborted(&self) -> bool {
        self.readiness == Readiness::Aborted
    }
}

/// Handover session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for agreement
    #[default]
    Pending,
    /// Agreement reached, role action running
    Initiated,
    /// Vessel reported the handover finished (terminal)
    Completed,
}

/// Role of the local process in a handover, derived from its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Currently responsible, relinquishes control
    Originator,
    /// Becoming responsible, takes over control
    Receiver,
    /// Tracks the handover without taking part
    Observer,
}

impl Role {
    pub fn is_participant(&self) -> bool {
        !matches!(self, Self::Observer)
    }
}

/// How a session reached `Phase::Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverOutcome {
    /// Completion signal after the handover was initiated
    Completed,
    /// Completion signal while still pending; the session was ended externally
    AbortedOutOfBand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_parsing_trims_payload() {
        assert_eq!(
            " READY\n".parse::<ReadinessAssertion>().unwrap(),
            ReadinessAssertion::Ready
        );
        assert_eq!(
            "ABORT".parse::<ReadinessAssertion>().unwrap(),
            ReadinessAssertion::Abort
        );
    }

    #[test]
    fn test_assertion_parsing_rejects_unknown_tokens() {
        assert!("ready".parse::<ReadinessAssertion>().is_err());
        assert!("ALIVE".parse::<ReadinessAssertion>().is_err());
        assert!("".parse::<ReadinessAssertion>().is_err());
    }

    #[test]
    fn test_new_party_is_uncertain() {
        let party = Party::new("ROC_1".into());
        assert_eq!(party.readiness, Readiness::Uncertain);
        assert!(!party.is_ready());
        assert!(!party.is_aborted());
    }

    #[test]
    fn test_readiness_serializes_uppercase() {
        let json = serde_json::to_string(&Readiness::Aborted).unwrap();
        assert_eq!(json, "\"ABORTED\"");
        let party: Party =
            serde_json::from_str(r#"{"id":"ROC_2","readiness":"READY"}"#).unwrap();
        assert_eq!(party.id, PartyId::from("ROC_2"));
        assert!(party.is_ready());
    }
}
