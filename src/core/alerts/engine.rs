// Proximity engine - evaluates position samples against a session target
// and decides when a notification goes out.

use std::time::Instant;

use super::dispatch::AlertSink;
use super::model::{CooldownMode, DisplayState, Evaluation, ProximityPolicy, SessionPhase};
use crate::core::geo::{distance_meters, GeoPoint, ProximityThreshold};

/// Where the user is heading and how close counts as "arrived".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub target: GeoPoint,
    pub threshold: ProximityThreshold,
}

/// Per-session alert state. One per tracking context, never shared.
#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    destination: Option<Destination>,
    triggered: bool,
    /// Instant of the last dispatch; always set while `triggered` is true
    last_trigger: Option<Instant>,
}

impl TrackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destination(destination: Destination) -> Self {
        Self {
            destination: Some(destination),
            ..Self::default()
        }
    }

    /// Begin tracking toward a new destination, discarding previous state.
    pub fn start(&mut self, destination: Destination) {
        *self = Self::with_destination(destination);
    }

    /// Stop tracking and return to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.destination, self.triggered) {
            (None, _) => SessionPhase::Idle,
            (Some(_), false) => SessionPhase::Armed,
            (Some(_), true) => SessionPhase::Alerting,
        }
    }
}

/// Stateless evaluator; all mutable state lives in the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityEngine {
    policy: ProximityPolicy,
}

impl ProximityEngine {
    pub fn new(policy: ProximityPolicy) -> Self {
        Self { policy }
    }

    pub fn for_mode(mode: CooldownMode) -> Self {
        Self::new(ProximityPolicy::for_mode(mode))
    }

    pub fn policy(&self) -> &ProximityPolicy {
        &self.policy
    }

    /// Evaluate one sample. Does not dispatch; `Evaluation::dispatched`
    /// tells the caller whether a notification is due.
    pub fn evaluate(
        &self,
        session: &mut TrackingSession,
        sample: &GeoPoint,
        now: Instant,
    ) -> Evaluation {
        let Some(destination) = session.destination else {
            return Evaluation::idle();
        };

        let distance = distance_meters(sample, &destination.target);
        let threshold = destination.threshold.meters();
        let distance_m = Some(distance.round() as u64);

        if distance <= threshold {
            let cooldown_elapsed = session
                .last_trigger
                .map(|last| now.saturating_duration_since(last) >= self.policy.cooldown)
                .unwrap_or(true);
            let dispatched = !session.triggered || cooldown_elapsed;
            if dispatched {
                session.last_trigger = Some(now);
            }
            session.triggered = true;

            return Evaluation {
                display: DisplayState::Alert,
                distance_m,
                dispatched,
            };
        }

        if distance > threshold + self.policy.hysteresis_band_meters {
            session.triggered = false;
        }

        // Inside the exit band an active alert keeps showing.
        let display = if session.triggered {
            DisplayState::Alert
        } else {
            DisplayState::NoAlert
        };

        Evaluation {
            display,
            distance_m,
            dispatched: false,
        }
    }
}

/// Session, evaluator and sink bundled for a single tracking context.
pub struct ProximityMonitor {
    engine: ProximityEngine,
    session: TrackingSession,
    sink: Box<dyn AlertSink>,
}

impl ProximityMonitor {
    pub fn new(engine: ProximityEngine, sink: Box<dyn AlertSink>) -> Self {
        Self {
            engine,
            session: TrackingSession::new(),
            sink,
        }
    }

    pub fn start(&mut self, destination: Destination) {
        log::info!(
            "Tracking toward ({:.5}, {:.5}), alert radius {} m",
            destination.target.latitude(),
            destination.target.longitude(),
            destination.threshold.meters()
        );
        self.session.start(destination);
    }

    pub fn stop(&mut self) {
        if self.session.phase() != SessionPhase::Idle {
            log::info!("Tracking stopped");
        }
        self.session.reset();
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    /// Evaluate a sample and notify the sink when a dispatch is due.
    pub fn observe(&mut self, sample: &GeoPoint, now: Instant) -> Evaluation {
        let evaluation = self.engine.evaluate(&mut self.session, sample, now);
        if evaluation.dispatched {
            if let Some(distance) = evaluation.distance_m {
                log::debug!("Dispatching proximity alert at {distance} m");
                self.sink.notify(distance as f64);
            }
        }
        evaluation
    }
}
