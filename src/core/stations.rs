//! Station catalog: the destinations a route can end at.

use std::fs;
use std::path::Path;

use super::error::StationError;
use super::model::Station;

#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    /// Build a catalog, rejecting duplicate names and bad coordinates.
    pub fn new(stations: Vec<Station>) -> Result<Self, StationError> {
        for (i, station) in stations.iter().enumerate() {
            station
                .location()
                .map_err(|source| StationError::BadCoordinates {
                    name: station.name.clone(),
                    source,
                })?;
            if stations[..i].iter().any(|s| s.name == station.name) {
                return Err(StationError::DuplicateStation(station.name.clone()));
            }
        }
        Ok(Self { stations })
    }

    /// Load a JSON array of `{ "name", "lat", "long" }` objects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StationError> {
        let content = fs::read_to_string(path.as_ref())?;
        let stations: Vec<Station> = serde_json::from_str(&content)?;
        log::info!("Loaded {} stations from {:?}", stations.len(), path.as_ref());
        Self::new(stations)
    }

    /// Exact name match first, then case-insensitive.
    pub fn find(&self, name: &str) -> Result<&Station, StationError> {
        let name = name.trim();
        self.stations
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.stations.iter().find(|s| s.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| StationError::UnknownStation(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stations.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
