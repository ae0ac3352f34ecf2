//! Pub/sub channel naming for one vessel and gate.

use handover_core::{InboundMessage, OutboundMessage};
use roc_common::constants::channels;
use roc_common::{HandoverError, PartyId};

/// Separator plus the characters `PSUBSCRIBE` treats as glob syntax
const RESERVED: &[char] = &['/', '*', '?', '[', ']', '\\'];

/// Check that `value` can stand as a single channel segment.
///
/// A party id containing `/` would publish on a readiness channel the
/// receiving side cannot attribute to a sender, and glob characters in the
/// vessel or gate id would widen the readiness pattern.
pub fn check_segment(label: &str, value: &str) -> Result<(), HandoverError> {
    if value.is_empty() {
        return Err(HandoverError::Config(format!("{label} must not be empty")));
    }
    if let Some(c) = value
        .chars()
        .find(|c| RESERVED.contains(c) || c.is_whitespace() || c.is_control())
    {
        return Err(HandoverError::Config(format!(
            "{label} {value:?} contains {c:?}, which cannot appear in a channel name"
        )));
    }
    Ok(())
}

/// Maps session messages to Redis channels and back.
///
/// ```text
/// {vessel}/handover/{gate}/readiness/{party}   READY | ABORT
/// {vessel}/handover/relinquish                 originator id
/// {vessel}/handover/takeover                   receiver id
/// {vessel}/handover/request                    vessel request
/// {vessel}/handover/state                      vessel state
/// {vessel}/handover/remote_time                seconds to gate
/// ```
#[derive(Debug, Clone)]
pub struct ChannelLayout {
    root: String,
    readiness_prefix: String,
}

impl ChannelLayout {
    pub fn new(vessel_id: &str, gate_id: &str) -> Self {
        let root = format!("{}/{}", vessel_id, channels::HANDOVER_ROOT);
        let readiness_prefix = format!("{}/{}/{}/", root, gate_id, channels::READINESS);
        Self {
            root,
            readiness_prefix,
        }
    }

    fn channel(&self, leaf: &str) -> String {
        format!("{}/{}", self.root, leaf)
    }

    pub fn readiness(&self, party: &PartyId) -> String {
        format!("{}{}", self.readiness_prefix, party)
    }

    /// Pattern matching every party's readiness channel
    pub fn readiness_pattern(&self) -> String {
        format!("{}*", self.readiness_prefix)
    }

    /// Plain channels published by the vessel
    pub fn vessel_channels(&self) -> Vec<String> {
        vec![
            self.channel(channels::REQUEST),
            self.channel(channels::STATE),
            self.channel(channels::REMOTE_TIME),
        ]
    }

    /// Channel and payload for an outbound message
    pub fn outbound(&self, message: &OutboundMessage) -> (String, String) {
        let channel = match message {
            OutboundMessage::Readiness { sender, .. } => self.readiness(sender),
            OutboundMessage::Relinquish { .. } => self.channel(channels::RELINQUISH),
            OutboundMessage::Takeover { .. } => self.channel(channels::TAKEOVER),
        };
        (channel, message.payload().to_string())
    }

    /// Classify a received message; `None` for channels the session does not consume
    pub fn inbound(&self, channel: &str, payload: String) -> Option<InboundMessage> {
        if let Some(sender) = channel.strip_prefix(&self.readiness_prefix) {
            if sender.is_empty() || sender.contains('/') {
                return None;
            }
            return Some(InboundMessage::Readiness {
                sender: sender.into(),
                payload,
            });
        }

        let leaf = channel.strip_prefix(&self.root)?.strip_prefix('/')?;
        match leaf {
            channels::REQUEST => Some(InboundMessage::VesselRequest { payload }),
            channels::STATE => Some(InboundMessage::State { payload }),
            channels::REMOTE_TIME => Some(InboundMessage::RemoteTime { payload }),
            _ => None,
        }
    }
}
