//! Two-party readiness table with the sticky-abort rule.

use roc_common::{HandoverError, Party, PartyId, Readiness};

/// Result of applying a readiness assertion to the register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessUpdate {
    /// Stored readiness changed
    Applied { previous: Readiness },
    /// Party already held this readiness
    Unchanged,
    /// Aborted party asserted anything but ABORTED; rejected, party stays ABORTED
    Conflict,
}

/// Readiness of the originating and the receiving party.
///
/// ABORTED dominates: once a party has aborted it can never again be
/// recorded as ready.
#[derive(Debug, Clone)]
pub struct ReadinessRegister {
    originator: Party,
    receiver: Party,
}

impl ReadinessRegister {
    pub fn new(originator: PartyId, receiver: PartyId) -> Result<Self, HandoverError> {
        if originator.is_empty() || receiver.is_empty() {
            return Err(HandoverError::Config("party ids must not be empty".into()));
        }
        if originator == receiver {
            return Err(HandoverError::Config(format!(
                "originator and receiver are both {originator}"
            )));
        }

        Ok(Self {
            originator: Party::new(originator),
            receiver: Party::new(receiver),
        })
    }

    /// Party losing responsibility
    pub fn originator(&self) -> &Party {
        &self.originator
    }

    /// Party gaining responsibility
    pub fn receiver(&self) -> &Party {
        &self.receiver
    }

    pub fn get(&self, id: &PartyId) -> Option<&Party> {
        if self.originator.id == *id {
            Some(&self.originator)
        } else if self.receiver.id == *id {
            Some(&self.receiver)
        } else {
            None
        }
    }

    /// Counterpart of `id`, or `None` if `id` is not a party
    pub fn get_other(&self, id: &PartyId) -> Option<&Party> {
        if self.originator.id == *id {
            Some(&self.receiver)
        } else if self.receiver.id == *id {
            Some(&self.originator)
        } else {
            None
        }
    }

    fn get_mut(&mut self, id: &PartyId) -> Option<&mut Party> {
        if self.originator.id == *id {
            Some(&mut self.originator)
        } else if self.receiver.id == *id {
            Some(&mut self.receiver)
        } else {
            None
        }
    }

    /// Update exactly one party's readiness.
    pub fn set_readiness(
        &mut self,
        id: &PartyId,
        readiness: Readiness,
    ) -> Result<ReadinessUpdate, HandoverError> {
        let party = self
            .get_mut(id)
            .ok_or_else(|| HandoverError::UnknownParty(id.to_string()))?;

        let previous = party.readiness;
        if previous == readiness {
            return Ok(ReadinessUpdate::Unchanged);
        }
        if previous == Readiness::Aborted {
            return Ok(ReadinessUpdate::Conflict);
        }

        party.readiness = readiness;
        Ok(ReadinessUpdate::Applied { previous })
    }

    pub fn both_ready(&self) -> bool {
        self.originator.is_ready() && self.receiver.is_ready()
    }
}
