//! SOS fan-out to emergency contacts over an SMS provider.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::model::{ContactBook, EmergencyContact, SosLocation};
use crate::core::error::{GatewayError, SosError};

pub const DEFAULT_SOS_MESSAGE: &str = "EMERGENCY! I need immediate help!";

/// Cached fixes older than this are re-acquired before sending.
pub fn location_max_age() -> Duration {
    Duration::minutes(5)
}

/// Outbound SMS provider. Returns the provider's message id.
pub trait SmsGateway: Send + Sync {
    fn send(&self, to: &str, body: &str) -> Result<String, GatewayError>;
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogGateway;

impl SmsGateway for LogGateway {
    fn send(&self, to: &str, body: &str) -> Result<String, GatewayError> {
        log::info!("SMS to {}: {}", to, body);
        Ok(format!("log-{}", to))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Delivered { message_id: String },
    Failed { error: String },
}

/// Per-contact result of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDelivery {
    pub contact_id: u64,
    pub name: String,
    pub phone_number: String,
    pub outcome: DeliveryOutcome,
}

impl ContactDelivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosReport {
    pub message: String,
    pub location: SosLocation,
    pub results: Vec<ContactDelivery>,
}

impl SosReport {
    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.is_delivered()).count()
    }
}

/// Use the cached fix if it is recent enough, otherwise ask for a new one.
pub fn resolve_location<F>(
    cached: Option<&SosLocation>,
    now: DateTime<Utc>,
    acquire: F,
) -> Result<SosLocation, SosError>
where
    F: FnOnce() -> Option<SosLocation>,
{
    match cached {
        Some(loc) if loc.is_fresh(now, location_max_age()) => Ok(loc.clone()),
        _ => acquire().ok_or(SosError::LocationUnavailable),
    }
}

pub struct SosDispatcher {
    gateway: Arc<dyn SmsGateway>,
}

impl SosDispatcher {
    pub fn new(gateway: Arc<dyn SmsGateway>) -> Self {
        Self { gateway }
    }

    /// Message text: custom or default alert line, then the maps link.
    pub fn compose_message(custom_message: Option<&str>, location: &SosLocation) -> String {
        let headline = custom_message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_SOS_MESSAGE);
        format!("{}\nMy location: {}", headline, location.maps_url())
    }

    /// Send `body` to every active contact. Inactive contacts are skipped.
    pub fn broadcast(&self, contacts: &[EmergencyContact], body: &str) -> Vec<ContactDelivery> {
        contacts
            .iter()
            .filter(|c| c.is_active)
            .map(|contact| {
                let outcome = match self.gateway.send(&contact.phone_number, body) {
                    Ok(message_id) => DeliveryOutcome::Delivered { message_id },
                    Err(e) => {
                        log::warn!("SOS to {} failed: {}", contact.name, e);
                        DeliveryOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                ContactDelivery {
                    contact_id: contact.id,
                    name: contact.name.clone(),
                    phone_number: contact.phone_number.clone(),
                    outcome,
                }
            })
            .collect()
    }

    /// Raise an SOS for the owner of `book`.
    pub fn send_sos(
        &self,
        book: &ContactBook,
        location: SosLocation,
        custom_message: Option<&str>,
    ) -> Result<SosReport, SosError> {
        let contacts: Vec<EmergencyContact> = book.active().into_iter().cloned().collect();
        if contacts.is_empty() {
            return Err(SosError::NoContacts);
        }

        let message = Self::compose_message(custom_message, &location);
        let results = self.broadcast(&contacts, &message);
        let report = SosReport {
            message,
            location,
            results,
        };

        log::info!(
            "SOS for {} delivered to {}/{} contacts",
            book.user_id,
            report.delivered(),
            report.results.len()
        );
        if report.delivered() == 0 {
            return Err(SosError::AllDeliveriesFailed(report.results.len()));
        }
        Ok(report)
    }
}
