// Alert model types: policy, display decisions and dispatched events.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum gap between two dispatches while the user stays inside the radius.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Extra distance past the threshold required before an alert re-arms.
pub const HYSTERESIS_BAND_METERS: f64 = 10.0;

/// Which re-alert behavior a session runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CooldownMode {
    /// 5 second cooldown between dispatches, 10 m exit band
    #[default]
    Standard,
    /// Deprecated: re-dispatch on every in-radius sample
    Legacy,
}

/// Timing and distance knobs used by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPolicy {
    pub cooldown: Duration,
    pub hysteresis_band_meters: f64,
}

impl ProximityPolicy {
    pub fn for_mode(mode: CooldownMode) -> Self {
        match mode {
            CooldownMode::Standard => Self::default(),
            CooldownMode::Legacy => Self {
                cooldown: Duration::ZERO,
                hysteresis_band_meters: HYSTERESIS_BAND_METERS,
            },
        }
    }
}

impl Default for ProximityPolicy {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            hysteresis_band_meters: HYSTERESIS_BAND_METERS,
        }
    }
}

/// Lifecycle phase of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No destination set
    Idle,
    /// Destination set, not inside the alert radius
    Armed,
    /// Inside the alert radius (or still within the exit band)
    Alerting,
}

/// What the tracker should show for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    Idle,
    NoAlert,
    Alert,
}

/// Outcome of evaluating one position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub display: DisplayState,
    /// Distance to the target rounded to whole meters (absent when idle)
    pub distance_m: Option<u64>,
    /// True when this sample produced a notification
    pub dispatched: bool,
}

impl Evaluation {
    pub fn idle() -> Self {
        Self {
            display: DisplayState::Idle,
            distance_m: None,
            dispatched: false,
        }
    }

    pub fn is_alert(&self) -> bool {
        self.display == DisplayState::Alert
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.display, self.distance_m) {
            (DisplayState::Alert, Some(d)) => write!(f, "Alert: {d} m"),
            (DisplayState::NoAlert, Some(d)) => write!(f, "No alert: {d} m"),
            _ => f.write_str("--"),
        }
    }
}

/// A notification that left the evaluator, as seen by sinks that forward it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub distance_meters: f64,
    pub message: String,
}

impl AlertEvent {
    pub fn new(distance_meters: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            distance_meters,
            message: format!(
                "Approaching destination: {:.0} m away",
                distance_meters
            ),
        }
    }
}
