use std::io;

use thiserror::Error;

/// Rejected geographic input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid proximity threshold: {0} m")]
    InvalidThreshold(f64),
}

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Failed to read station catalog: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed station catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("Duplicate station: {0}")]
    DuplicateStation(String),

    #[error("Station {name} has bad coordinates: {source}")]
    BadCoordinates { name: String, source: GeoError },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Contact {0} not found")]
    NotFound(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SosError {
    #[error("No emergency contacts configured. Please add emergency contacts first.")]
    NoContacts,

    #[error("Unable to get current location. SOS alert cannot be sent without location.")]
    LocationUnavailable,

    #[error("Failed to deliver SOS to any of {0} contacts")]
    AllDeliveriesFailed(usize),
}

/// Failure reported by an SMS provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SMS gateway error: {0}")]
pub struct GatewayError(pub String);
