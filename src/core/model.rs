use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::GeoError;
use super::geo::GeoPoint;

/// A named stop from the station catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub lat: f64,
    pub long: f64,
}

impl Station {
    pub fn location(&self) -> Result<GeoPoint, GeoError> {
        GeoPoint::new(self.lat, self.long)
    }
}

/// One position reading from the positioning source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionFix {
    pub point: GeoPoint,
    /// Wall-clock time of the fix (Duration from epoch), when the source stamps it
    pub timestamp: Option<Duration>,
}
