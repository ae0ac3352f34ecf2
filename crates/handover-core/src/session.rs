//! Handover session state machine.
//!
//! `PENDING → INITIATED → COMPLETED`. The session moves to INITIATED exactly
//! once, when both parties are READY and the vessel has requested the
//! handover, and only an external completion signal moves it to COMPLETED.

use roc_common::constants::{
    markers, DEFAULT_GATE_ID, DEFAULT_ORIGINATOR_ID, DEFAULT_RECEIVER_ID, DEFAULT_VESSEL_ID,
    TAKEOVER_INTERVAL_MS, VESSEL_POLL_INTERVAL_MS,
};
use roc_common::{
    HandoverError, HandoverOutcome, Party, PartyId, Phase, Readiness, ReadinessAssertion, Role,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::message::{InboundMessage, OutboundMessage};
use crate::ports::{TimerId, TimerSource, TransportPort};
use crate::register::{ReadinessRegister, ReadinessUpdate};

/// Everything a session needs to know up front
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Safety gate this session governs
    pub gate_id: String,
    /// Vessel crossing the gate
    pub vessel_id: String,
    /// Identity of the local ROC
    pub self_id: PartyId,
    /// ROC relinquishing responsibility
    pub originator_id: PartyId,
    /// ROC taking over responsibility
    pub receiver_id: PartyId,
    /// Substring marking a vessel request payload
    pub request_marker: String,
    /// Substring marking a completed-handover state payload
    pub completion_marker: String,
    /// Agreement re-check period once the vessel request is latched
    pub vessel_poll_interval: Duration,
    /// Takeover notice period
    pub takeover_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gate_id: DEFAULT_GATE_ID.to_string(),
            vessel_id: DEFAULT_VESSEL_ID.to_string(),
            self_id: PartyId::from(DEFAULT_ORIGINATOR_ID),
            originator_id: PartyId::from(DEFAULT_ORIGINATOR_ID),
            receiver_id: PartyId::from(DEFAULT_RECEIVER_ID),
            request_marker: markers::READY_FOR_HANDOVER.to_string(),
            completion_marker: markers::HANDOVER_COMPLETED.to_string(),
            vessel_poll_interval: Duration::from_millis(VESSEL_POLL_INTERVAL_MS),
            takeover_interval: Duration::from_millis(TAKEOVER_INTERVAL_MS),
        }
    }
}

/// Read-only view of a session for presentation layers
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub gate_id: String,
    pub vessel_id: String,
    pub self_id: PartyId,
    pub role: Role,
    pub phase: Phase,
    pub originator: Party,
    pub receiver: Party,
    pub vessel_requested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<HandoverOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controlling_party: Option<PartyId>,
    /// Unix epoch seconds when the snapshot was taken
    pub taken_at: i64,
}

/// Handover coordination for one (vessel, gate) pair
pub struct HandoverSession<T, S> {
    config: SessionConfig,
    register: ReadinessRegister,
    vessel_requested: bool,
    phase: Phase,
    takeover_active: bool,
    seconds_remaining: Option<f64>,
    outcome: Option<HandoverOutcome>,
    controlling_party: Option<PartyId>,
    transport: T,
    timers: S,
}

impl<T: TransportPort, S: TimerSource> HandoverSession<T, S> {
    pub fn new(config: SessionConfig, transport: T, timers: S) -> Result<Self, HandoverError> {
        if config.self_id.is_empty() {
            return Err(HandoverError::Config("self id must not be empty".into()));
        }
        let register =
            ReadinessRegister::new(config.originator_id.clone(), config.receiver_id.clone())?;

        let session = Self {
            config,
            register,
            vessel_requested: false,
            phase: Phase::Pending,
            takeover_active: false,
            seconds_remaining: None,
            outcome: None,
            controlling_party: None,
            transport,
            timers,
        };

        info!(
            vessel = %session.config.vessel_id,
            gate = %session.config.gate_id,
            self_id = %session.config.self_id,
            role = ?session.role(),
            "Handover session created"
        );

        Ok(session)
    }

    // === Accessors ===

    pub fn gate_id(&self) -> &str {
        &self.config.gate_id
    }

    pub fn vessel_id(&self) -> &str {
        &self.config.vessel_id
    }

    pub fn self_id(&self) -> &PartyId {
        &self.config.self_id
    }

    pub fn role(&self) -> Role {
        if self.config.self_id == self.config.originator_id {
            Role::Originator
        } else if self.config.self_id == self.config.receiver_id {
            Role::Receiver
        } else {
            Role::Observer
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn vessel_requested(&self) -> bool {
        self.vessel_requested
    }

    /// Current readiness of a party, `None` for an unknown id
    pub fn readiness(&self, id: &PartyId) -> Option<Readiness> {
        self.register.get(id).map(|party| party.readiness)
    }

    pub fn register(&self) -> &ReadinessRegister {
        &self.register
    }

    /// Seconds until the vessel reaches the gate, as last reported by the vessel
    pub fn seconds_remaining(&self) -> Option<f64> {
        self.seconds_remaining
    }

    pub fn outcome(&self) -> Option<HandoverOutcome> {
        self.outcome
    }

    /// ROC named as controlling by the completion signal, if it named one
    pub fn controlling_party(&self) -> Option<&PartyId> {
        self.controlling_party.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timers(&self) -> &S {
        &self.timers
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            gate_id: self.config.gate_id.clone(),
            vessel_id: self.config.vessel_id.clone(),
            self_id: self.config.self_id.clone(),
            role: self.role(),
            phase: self.phase,
            originator: self.register.originator().clone(),
            receiver: self.register.receiver().clone(),
            vessel_requested: self.vessel_requested,
            seconds_remaining: self.seconds_remaining,
            outcome: self.outcome,
            controlling_party: self.controlling_party.clone(),
            taken_at: chrono::Utc::now().timestamp(),
        }
    }

    // === Local operator decisions ===

    /// Declare the local ROC ready and tell the other party.
    ///
    /// Once the local ROC has aborted, READY is refused with
    /// [`HandoverError::Conflict`] and nothing is published.
    pub fn assert_ready(&mut self) -> Result<(), HandoverError> {
        self.require_participant("assert ready")?;

        let self_id = self.config.self_id.clone();
        if self.register.get(&self_id).is_some_and(Party::is_aborted) {
            error!(party = %self_id, "Conflict: local ROC already ABORTED, READY not asserted");
            return Err(HandoverError::Conflict(format!(
                "{self_id} has already aborted this handover"
            )));
        }

        info!(party = %self_id, "Asserting READY");
        self.transport.publish(OutboundMessage::Readiness {
            sender: self_id.clone(),
            assertion: ReadinessAssertion::Ready,
        })?;
        self.apply(&self_id, Readiness::Ready)?;
        self.evaluate().map(|_| ())
    }

    /// Abort the handover from the local side.
    ///
    /// The abort is recorded locally even when the transport rejects the
    /// outbound assertion; the publish error is still returned.
    pub fn assert_abort(&mut self) -> Result<(), HandoverError> {
        self.require_participant("abort")?;

        let self_id = self.config.self_id.clone();
        warn!(party = %self_id, "Aborting handover");
        self.apply(&self_id, Readiness::Aborted)?;
        let published = self.transport.publish(OutboundMessage::Readiness {
            sender: self_id,
            assertion: ReadinessAssertion::Abort,
        });
        self.evaluate()?;
        published
    }

    // === Inbound ===

    /// Single entry point for messages delivered by the transport.
    pub fn handle(&mut self, message: InboundMessage) -> Result<(), HandoverError> {
        match message {
            InboundMessage::Readiness { sender, payload } => self.on_readiness(&sender, &payload),
            InboundMessage::VesselRequest { payload } => self.on_vessel_request(&payload),
            InboundMessage::State { payload } => {
                self.on_state(&payload);
                Ok(())
            }
            InboundMessage::RemoteTime { payload } => {
                self.on_remote_time(&payload);
                Ok(())
            }
        }
    }

    /// Entry point for timer notifications.
    pub fn on_tick(&mut self, timer: TimerId) -> Result<(), HandoverError> {
        match timer {
            TimerId::VesselPoll => {
                if self.phase == Phase::Pending && self.vessel_requested {
                    self.evaluate().map(|_| ())
                } else {
                    trace!("Dropping vessel poll tick outside pending phase");
                    Ok(())
                }
            }
            TimerId::Takeover => {
                if self.phase != Phase::Initiated || !self.takeover_active {
                    debug!(phase = ?self.phase, "Dropping stale takeover tick");
                    return Ok(());
                }
                trace!(party = %self.config.self_id, "Publishing takeover");
                self.transport.publish(OutboundMessage::Takeover {
                    party: self.config.self_id.clone(),
                })
            }
        }
    }

    fn on_readiness(&mut self, sender: &PartyId, payload: &str) -> Result<(), HandoverError> {
        if *sender == self.config.self_id {
            trace!(party = %sender, "Ignoring own readiness echo");
            return Ok(());
        }
        if self.register.get(sender).is_none() {
            warn!(party = %sender, "Received assertion for unknown ROC");
            return Ok(());
        }

        let assertion = match payload.parse::<ReadinessAssertion>() {
            Ok(assertion) => assertion,
            Err(e) => {
                warn!(party = %sender, error = %e, "Discarding readiness message");
                return Ok(());
            }
        };

        info!(party = %sender, assertion = assertion.token(), "Received readiness assertion");
        self.apply(sender, assertion.readiness())?;
        self.evaluate().map(|_| ())
    }

    fn on_vessel_request(&mut self, payload: &str) -> Result<(), HandoverError> {
        if !payload.contains(&self.config.request_marker) {
            warn!(payload = %payload, "Discarding vessel request without handover marker");
            return Ok(());
        }
        if self.vessel_requested {
            debug!("Vessel request already latched");
            return Ok(());
        }

        self.vessel_requested = true;
        info!(vessel = %self.config.vessel_id, "Vessel requested handover");

        if self.phase == Phase::Pending {
            self.timers
                .start(TimerId::VesselPoll, self.config.vessel_poll_interval);
        }
        self.evaluate().map(|_| ())
    }

    fn on_state(&mut self, payload: &str) {
        if !payload.contains(&self.config.completion_marker) {
            debug!(payload = %payload, "Handover state update");
            return;
        }
        if self.phase == Phase::Completed {
            debug!("Handover already completed");
            return;
        }

        self.cancel_timers();
        self.controlling_party = parse_new_priority(payload);

        let outcome = if self.phase == Phase::Initiated {
            info!(
                vessel = %self.config.vessel_id,
                controlling = ?self.controlling_party,
                "✅ Handover completed"
            );
            HandoverOutcome::Completed
        } else {
            warn!(
                vessel = %self.config.vessel_id,
                controlling = ?self.controlling_party,
                "Completion received before initiation, session ended out-of-band"
            );
            HandoverOutcome::AbortedOutOfBand
        };

        self.outcome = Some(outcome);
        self.phase = Phase::Completed;
    }

    fn on_remote_time(&mut self, payload: &str) {
        match payload.trim().parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => self.seconds_remaining = Some(seconds),
            _ => debug!(payload = %payload, "Ignoring unparsable remote time"),
        }
    }

    // === Agreement ===

    /// Re-evaluate the agreement predicate, initiating the handover if it holds.
    ///
    /// Returns whether this call initiated the handover.
    pub fn evaluate(&mut self) -> Result<bool, HandoverError> {
        if self.phase != Phase::Pending {
            return Ok(false);
        }

        debug!(
            originator = %self.register.originator().readiness,
            receiver = %self.register.receiver().readiness,
            vessel_requested = self.vessel_requested,
            "Evaluating handover agreement"
        );

        if self.register.both_ready() && self.vessel_requested {
            self.perform_handover()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Initiate the handover and run the local role's action.
    ///
    /// Calling this while either party is not READY is a logic defect and
    /// yields [`HandoverError::ProtocolViolation`].
    pub fn perform_handover(&mut self) -> Result<(), HandoverError> {
        if !self.register.both_ready() {
            error!(
                originator = %self.register.originator().readiness,
                receiver = %self.register.receiver().readiness,
                "Handover action invoked while both ROCs are not ready"
            );
            return Err(HandoverError::ProtocolViolation(
                "cannot perform handover when both ROCs are not ready".into(),
            ));
        }
        if self.phase != Phase::Pending {
            debug!(phase = ?self.phase, "Handover already initiated");
            return Ok(());
        }

        self.phase = Phase::Initiated;
        self.timers.cancel(TimerId::VesselPoll);
        info!(
            vessel = %self.config.vessel_id,
            gate = %self.config.gate_id,
            role = ?self.role(),
            "🚢 Performing handover"
        );

        match self.role() {
            Role::Originator => {
                info!(party = %self.config.self_id, "Relinquishing control");
                self.transport.publish(OutboundMessage::Relinquish {
                    party: self.config.self_id.clone(),
                })
            }
            Role::Receiver => {
                info!(party = %self.config.self_id, "Taking over control");
                self.takeover_active = true;
                self.timers
                    .start(TimerId::Takeover, self.config.takeover_interval);
                Ok(())
            }
            Role::Observer => {
                info!("This ROC is not involved in the handover");
                Ok(())
            }
        }
    }

    /// Cancel every timer; called when the owning process shuts down.
    pub fn teardown(&mut self) {
        self.cancel_timers();
        debug!(vessel = %self.config.vessel_id, "Handover session torn down");
    }

    // === Internals ===

    fn apply(&mut self, id: &PartyId, readiness: Readiness) -> Result<(), HandoverError> {
        match self.register.set_readiness(id, readiness)? {
            ReadinessUpdate::Applied { previous } => {
                info!(party = %id, %previous, current = %readiness, "Readiness updated");
                if self.phase == Phase::Initiated && readiness == Readiness::Aborted {
                    warn!(party = %id, "ABORT received after handover was initiated");
                }
            }
            ReadinessUpdate::Unchanged => {
                debug!(party = %id, %readiness, "Readiness unchanged");
            }
            ReadinessUpdate::Conflict => {
                error!(
                    party = %id,
                    asserted = %readiness,
                    "Conflict: ROC had previously ABORTED but tried to change readiness"
                );
            }
        }
        Ok(())
    }

    fn require_participant(&self, action: &str) -> Result<(), HandoverError> {
        if self.role().is_participant() {
            Ok(())
        } else {
            Err(HandoverError::NotAParticipant(format!(
                "{} cannot {action} in a handover between {} and {}",
                self.config.self_id, self.config.originator_id, self.config.receiver_id
            )))
        }
    }

    fn cancel_timers(&mut self) {
        self.takeover_active = false;
        self.timers.cancel(TimerId::Takeover);
        self.timers.cancel(TimerId::VesselPoll);
    }
}

/// Extract the ROC named by `new_priority={roc_id}` in a state payload
fn parse_new_priority(payload: &str) -> Option<PartyId> {
    let start = payload.find(markers::NEW_PRIORITY_PREFIX)? + markers::NEW_PRIORITY_PREFIX.len();
    let id: String = payload[start..]
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    (!id.is_empty()).then(|| PartyId::from(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualTimers, RecordingTransport};
    use tokio_test::{assert_err, assert_ok};

    type TestSession = HandoverSession<RecordingTransport, ManualTimers>;

    const A: &str = "ROC_1";
    const B: &str = "ROC_2";

    fn session_as(self_id: &str) -> TestSession {
        let config = SessionConfig {
            self_id: self_id.into(),
            ..Default::default()
        };
        HandoverSession::new(config, RecordingTransport::connected(), ManualTimers::default())
            .unwrap()
    }

    fn readiness_from(sender: &str, payload: &str) -> InboundMessage {
        InboundMessage::Readiness {
            sender: sender.into(),
            payload: payload.to_string(),
        }
    }

    fn vessel_request() -> InboundMessage {
        InboundMessage::VesselRequest {
            payload: "MASS_0 READY_FOR_HANDOVER".to_string(),
        }
    }

    fn completed(payload: &str) -> InboundMessage {
        InboundMessage::State {
            payload: payload.to_string(),
        }
    }

    fn relinquish_count(session: &TestSession) -> usize {
        session
            .transport()
            .sent
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Relinquish { .. }))
            .count()
    }

    fn takeover_count(session: &TestSession) -> usize {
        session
            .transport()
            .sent
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Takeover { .. }))
            .count()
    }

    #[test]
    fn test_role_is_derived_from_self_id() {
        assert_eq!(session_as(A).role(), Role::Originator);
        assert_eq!(session_as(B).role(), Role::Receiver);
        assert_eq!(session_as("ROC_3").role(), Role::Observer);
    }

    #[test]
    fn test_rejects_empty_self_id() {
        let config = SessionConfig {
            self_id: "".into(),
            ..Default::default()
        };
        let result =
            HandoverSession::new(config, RecordingTransport::connected(), ManualTimers::default());
        assert!(matches!(result, Err(HandoverError::Config(_))));
    }

    #[test]
    fn test_one_party_uncertain_stays_pending() {
        let mut session = session_as(A);
        assert_ok!(session.handle(vessel_request()));
        assert_ok!(session.assert_ready());

        assert_eq!(session.readiness(&B.into()), Some(Readiness::Uncertain));
        assert_eq!(session.phase(), Phase::Pending);
        assert_ok!(session.on_tick(TimerId::VesselPoll));
        assert_eq!(session.phase(), Phase::Pending);
        assert_eq!(relinquish_count(&session), 0);
    }

    #[test]
    fn test_vessel_request_completes_agreement() {
        let mut session = session_as(A);
        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(readiness_from(B, "READY")));

        assert!(session.register().both_ready());
        assert_eq!(session.phase(), Phase::Pending);

        assert_ok!(session.handle(vessel_request()));
        assert_eq!(session.phase(), Phase::Initiated);
        assert!(!session.timers().is_active(TimerId::VesselPoll));
    }

    #[test]
    fn test_poll_tick_initiates_when_readiness_arrives_late() {
        let mut session = session_as(A);
        assert_ok!(session.handle(vessel_request()));
        assert!(session.timers().is_active(TimerId::VesselPoll));
        assert_eq!(
            session.timers().period(TimerId::VesselPoll),
            Some(Duration::from_secs(1))
        );

        assert_ok!(session.assert_ready());
        assert_ok!(session.on_tick(TimerId::VesselPoll));
        assert_eq!(session.phase(), Phase::Pending);

        assert_ok!(session.handle(readiness_from(B, " READY ")));
        assert_eq!(session.phase(), Phase::Initiated);
        assert_ok!(session.on_tick(TimerId::VesselPoll));
        assert_eq!(relinquish_count(&session), 1);
    }

    #[test]
    fn test_ready_after_abort_keeps_party_aborted() {
        let mut session = session_as(A);
        assert_ok!(session.handle(readiness_from(B, "ABORT")));
        assert_ok!(session.handle(readiness_from(B, "READY")));

        assert_eq!(session.readiness(&B.into()), Some(Readiness::Aborted));

        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(vessel_request()));
        assert_eq!(session.phase(), Phase::Pending);
    }

    #[test]
    fn test_unknown_party_changes_nothing() {
        let mut session = session_as(A);
        let stranger = PartyId::from("ROC_9");

        assert!(session.register().get_other(&stranger).is_none());
        assert!(session.readiness(&stranger).is_none());
        assert_ok!(session.handle(readiness_from("ROC_9", "READY")));

        assert_eq!(session.readiness(&A.into()), Some(Readiness::Uncertain));
        assert_eq!(session.readiness(&B.into()), Some(Readiness::Uncertain));
    }

    #[test]
    fn test_unrecognized_payloads_are_discarded() {
        let mut session = session_as(A);
        assert_ok!(session.handle(readiness_from(B, "ALIVE")));
        assert_ok!(session.handle(InboundMessage::VesselRequest {
            payload: "something else".to_string(),
        }));

        assert_eq!(session.readiness(&B.into()), Some(Readiness::Uncertain));
        assert!(!session.vessel_requested());
        assert!(!session.timers().is_active(TimerId::VesselPoll));
    }

    #[test]
    fn test_own_echo_is_ignored() {
        let mut session = session_as(A);
        assert_ok!(session.assert_abort());
        assert_ok!(session.handle(readiness_from(A, "READY")));
        assert_eq!(session.readiness(&A.into()), Some(Readiness::Aborted));
    }

    #[test]
    fn test_originator_relinquishes_exactly_once() {
        let mut session = session_as(A);
        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(readiness_from(B, "READY")));
        assert_ok!(session.handle(vessel_request()));

        for _ in 0..3 {
            assert_ok!(session.handle(readiness_from(B, "READY")));
            assert_ok!(session.handle(vessel_request()));
            assert!(!session.evaluate().unwrap());
            assert_ok!(session.perform_handover());
        }

        assert_eq!(relinquish_count(&session), 1);
        assert_eq!(
            session.transport().sent.last(),
            Some(&OutboundMessage::Relinquish { party: A.into() })
        );
        assert!(session.timers().active.is_empty());
    }

    #[test]
    fn test_initiation_without_agreement_is_a_protocol_violation() {
        let mut session = session_as(A);
        assert_ok!(session.assert_ready());

        let err = assert_err!(session.perform_handover());
        assert!(matches!(err, HandoverError::ProtocolViolation(_)));
        assert!(err.is_fatal());
        assert_eq!(session.phase(), Phase::Pending);
    }

    #[test]
    fn test_receiver_takeover_stops_after_completion() {
        let mut session = session_as(B);
        assert_ok!(session.handle(readiness_from(A, "READY")));
        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(vessel_request()));

        assert_eq!(session.phase(), Phase::Initiated);
        assert_eq!(takeover_count(&session), 0);
        assert_eq!(
            session.timers().period(TimerId::Takeover),
            Some(Duration::from_secs(1))
        );

        // Ticks at t=1s, 2s, 3s, completion at t=3.4s.
        for _ in 0..3 {
            assert!(session.timers().is_active(TimerId::Takeover));
            assert_ok!(session.on_tick(TimerId::Takeover));
        }
        assert_ok!(session.handle(completed("HANDOVER_COMPLETED new_priority=ROC_2")));
        assert!(!session.timers().is_active(TimerId::Takeover));

        // A tick already queued before cancellation must not publish.
        assert_ok!(session.on_tick(TimerId::Takeover));

        assert_eq!(takeover_count(&session), 3);
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.outcome(), Some(HandoverOutcome::Completed));
        assert_eq!(session.controlling_party(), Some(&PartyId::from(B)));
    }

    #[test]
    fn test_abort_after_initiation_keeps_phase() {
        let mut session = session_as(B);
        assert_ok!(session.handle(readiness_from(A, "READY")));
        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(vessel_request()));
        assert_eq!(session.phase(), Phase::Initiated);

        assert_ok!(session.handle(readiness_from(A, "ABORT")));

        assert_eq!(session.readiness(&A.into()), Some(Readiness::Aborted));
        assert!(!session.register().both_ready());
        assert_eq!(session.phase(), Phase::Initiated);
        assert!(session.timers().is_active(TimerId::Takeover));
        assert_ok!(session.on_tick(TimerId::Takeover));
        assert_eq!(takeover_count(&session), 1);
    }

    #[test]
    fn test_failed_takeover_is_retried_on_next_tick() {
        let mut session = session_as(B);
        assert_ok!(session.handle(readiness_from(A, "READY")));
        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(vessel_request()));

        session.transport.connected = false;
        let err = assert_err!(session.on_tick(TimerId::Takeover));
        assert!(matches!(err, HandoverError::TransportNotReady(_)));
        assert!(!err.is_fatal());
        assert_eq!(takeover_count(&session), 0);
        assert!(session.timers().is_active(TimerId::Takeover));

        session.transport.connected = true;
        assert_ok!(session.on_tick(TimerId::Takeover));
        assert_eq!(takeover_count(&session), 1);
        assert_eq!(session.phase(), Phase::Initiated);
    }

    #[test]
    fn test_observer_only_tracks_state() {
        let mut session = session_as("ROC_3");
        assert_ok!(session.handle(readiness_from(A, "READY")));
        assert_ok!(session.handle(readiness_from(B, "READY")));
        assert_ok!(session.handle(vessel_request()));

        assert_eq!(session.phase(), Phase::Initiated);
        assert!(session.transport().sent.is_empty());
        assert!(session.timers().active.is_empty());
        assert!(matches!(
            session.assert_ready(),
            Err(HandoverError::NotAParticipant(_))
        ));
    }

    #[test]
    fn test_completion_while_pending_is_out_of_band() {
        let mut session = session_as(A);
        assert_ok!(session.handle(vessel_request()));
        assert_ok!(session.handle(completed("HANDOVER_COMPLETED")));

        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.outcome(), Some(HandoverOutcome::AbortedOutOfBand));
        assert!(session.timers().active.is_empty());

        assert_ok!(session.assert_ready());
        assert_ok!(session.handle(readiness_from(B, "READY")));
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(relinquish_count(&session), 0);
    }

    #[test]
    fn test_state_without_marker_is_not_completion() {
        let mut session = session_as(A);
        assert_ok!(session.handle(completed("HANDOVER_PENDING")));
        assert_eq!(session.phase(), Phase::Pending);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_abort_is_recorded_even_when_transport_is_down() {
        let config = SessionConfig {
            self_id: A.into(),
            ..Default::default()
        };
        let mut session = HandoverSession::new(
            config,
            RecordingTransport::disconnected(),
            ManualTimers::default(),
        )
        .unwrap();

        let err = assert_err!(session.assert_ready());
        assert!(matches!(err, HandoverError::TransportNotReady(_)));
        assert_eq!(session.readiness(&A.into()), Some(Readiness::Uncertain));

        assert!(session.assert_abort().is_err());
        assert_eq!(session.readiness(&A.into()), Some(Readiness::Aborted));
    }

    #[test]
    fn test_local_ready_after_local_abort_is_a_conflict() {
        let mut session = session_as(B);
        assert_ok!(session.assert_abort());

        let err = assert_err!(session.assert_ready());
        assert!(matches!(err, HandoverError::Conflict(_)));
        assert!(!err.is_fatal());

        assert_eq!(session.readiness(&B.into()), Some(Readiness::Aborted));
        assert_eq!(
            session.transport().sent,
            vec![OutboundMessage::Readiness {
                sender: B.into(),
                assertion: ReadinessAssertion::Abort,
            }]
        );
    }

    #[test]
    fn test_teardown_cancels_timers() {
        let mut session = session_as(B);
        assert_ok!(session.handle(vessel_request()));
        assert_ok!(session.handle(readiness_from(A, "READY")));
        assert_ok!(session.assert_ready());
        assert!(session.timers().is_active(TimerId::Takeover));

        session.teardown();
        assert!(session.timers().active.is_empty());
        assert_ok!(session.on_tick(TimerId::Takeover));
        assert_eq!(takeover_count(&session), 0);
    }

    #[test]
    fn test_remote_time_updates_countdown() {
        let mut session = session_as("ROC_3");
        assert_ok!(session.handle(InboundMessage::RemoteTime {
            payload: "42.5".to_string(),
        }));
        assert_eq!(session.seconds_remaining(), Some(42.5));

        assert_ok!(session.handle(InboundMessage::RemoteTime {
            payload: "NaN".to_string(),
        }));
        assert_eq!(session.seconds_remaining(), Some(42.5));
    }

    #[test]
    fn test_snapshot_serializes_for_display() {
        let mut session = session_as(A);
        assert_ok!(session.assert_ready());
        let json = serde_json::to_value(session.snapshot()).unwrap();

        assert_eq!(json["role"], "originator");
        assert_eq!(json["phase"], "pending");
        assert_eq!(json["originator"]["readiness"], "READY");
        assert!(json.get("outcome").is_none());
    }

    #[test]
    fn test_parse_new_priority() {
        assert_eq!(
            parse_new_priority("HANDOVER_COMPLETED;new_priority=ROC_2;t=1"),
            Some(PartyId::from("ROC_2"))
        );
        assert_eq!(parse_new_priority("HANDOVER_COMPLETED"), None);
        assert_eq!(parse_new_priority("new_priority="), None);
    }
}
