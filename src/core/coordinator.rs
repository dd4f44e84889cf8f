use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::alerts::dispatch::AlertSink;
use super::alerts::engine::{Destination, ProximityEngine, ProximityMonitor};
use super::alerts::model::Evaluation;
use super::geo::GeoPoint;
use super::model::PositionFix;
use super::tracker::PositionSource;

/// What the position pipeline is doing, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingStatus {
    Idle,
    Starting,
    /// Last sample came from the push source
    Watch,
    /// Last sample came from the fallback poll
    Poll,
    Stopped,
}

/// Drops fallback polls that land too close behind an accepted sample.
#[derive(Debug, Clone)]
pub struct SampleGate {
    min_poll_gap: Duration,
    last_accepted: Option<Instant>,
}

impl SampleGate {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            min_poll_gap: poll_interval / 2,
            last_accepted: None,
        }
    }

    /// Push samples always pass.
    pub fn accept_push(&mut self, now: Instant) {
        self.last_accepted = Some(now);
    }

    pub fn accept_poll(&mut self, now: Instant) -> bool {
        let recent = self
            .last_accepted
            .is_some_and(|last| now.saturating_duration_since(last) < self.min_poll_gap);
        if recent {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

pub struct CoordinatorOutput {
    pub evaluations: Vec<Evaluation>,
    pub logs: Vec<String>,
}

/// Glue between position delivery (push + poll) and the proximity monitor.
pub struct Coordinator {
    monitor: ProximityMonitor,
    gate: SampleGate,
    status: TrackingStatus,
    last_point: Option<GeoPoint>,
    last_evaluation: Evaluation,
}

impl Coordinator {
    pub fn new(engine: ProximityEngine, sink: Box<dyn AlertSink>, poll_interval: Duration) -> Self {
        Self {
            monitor: ProximityMonitor::new(engine, sink),
            gate: SampleGate::new(poll_interval),
            status: TrackingStatus::Idle,
            last_point: None,
            last_evaluation: Evaluation::idle(),
        }
    }

    /// Start a new route. Any previous session state is discarded.
    pub fn start_route(&mut self, destination: Destination) {
        self.monitor.start(destination);
        self.gate.reset();
        self.status = TrackingStatus::Starting;
        self.last_evaluation = Evaluation::idle();
    }

    pub fn stop(&mut self) {
        self.monitor.stop();
        self.gate.reset();
        self.status = TrackingStatus::Stopped;
        self.last_evaluation = Evaluation::idle();
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn monitor(&self) -> &ProximityMonitor {
        &self.monitor
    }

    pub fn last_evaluation(&self) -> &Evaluation {
        &self.last_evaluation
    }

    pub fn last_point(&self) -> Option<GeoPoint> {
        self.last_point
    }

    /// A sample from the push source.
    pub fn on_push(&mut self, fix: &PositionFix, now: Instant) -> Evaluation {
        self.gate.accept_push(now);
        self.last_point = Some(fix.point);
        if self.status != TrackingStatus::Stopped {
            self.status = TrackingStatus::Watch;
        }
        self.evaluate(fix.point, now)
    }

    /// Fallback poll: re-evaluate the last known position unless a push
    /// sample arrived recently.
    pub fn on_poll(&mut self, now: Instant) -> Option<Evaluation> {
        let point = self.last_point?;
        if !self.gate.accept_poll(now) {
            return None;
        }
        if self.status != TrackingStatus::Stopped {
            self.status = TrackingStatus::Poll;
        }
        Some(self.evaluate(point, now))
    }

    /// Drain a position source and evaluate every fix it yields.
    pub fn tick(&mut self, source: &mut dyn PositionSource, now: Instant) -> CoordinatorOutput {
        let mut logs = Vec::new();
        let mut evaluations = Vec::new();

        match source.poll_fixes() {
            Ok(fixes) => {
                if !fixes.is_empty() {
                    logs.push(format!("Read {} new positions", fixes.len()));
                }
                for fix in &fixes {
                    evaluations.push(self.on_push(fix, now));
                }
            }
            Err(e) => logs.push(format!("Error reading positions: {}", e)),
        }

        CoordinatorOutput { evaluations, logs }
    }

    fn evaluate(&mut self, point: GeoPoint, now: Instant) -> Evaluation {
        let evaluation = self.monitor.observe(&point, now);
        self.last_evaluation = evaluation;
        evaluation
    }
}
