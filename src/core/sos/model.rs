//! Data model for emergency contacts and SOS locations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::ContactError;
use crate::core::geo::GeoPoint;

/// A person to notify when the user raises an SOS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub id: u64,
    pub user_id: String,
    pub name: String,
    pub phone_number: String,
    pub relationship: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// User input for a new contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub name: String,
    pub phone_number: String,
    pub relationship: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// Partial edit of an existing contact. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub relationship: Option<String>,
    pub is_primary: Option<bool>,
    pub is_active: Option<bool>,
}

fn required(value: &str, field: &'static str) -> Result<String, ContactError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ContactError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// All contacts for one user. At most one is primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactBook {
    pub user_id: String,
    pub contacts: Vec<EmergencyContact>,
    /// Missing in older files; `add` never hands out an id at or below an existing one.
    #[serde(default)]
    next_id: u64,
}

impl ContactBook {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            contacts: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a contact. Fields are trimmed and must be non-empty.
    pub fn add(&mut self, draft: ContactDraft, now: DateTime<Utc>) -> Result<&EmergencyContact, ContactError> {
        let id = self.next_free_id();
        let contact = EmergencyContact {
            id,
            user_id: self.user_id.clone(),
            name: required(&draft.name, "name")?,
            phone_number: required(&draft.phone_number, "phoneNumber")?,
            relationship: required(&draft.relationship, "relationship")?,
            is_primary: draft.is_primary,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.next_id = id + 1;

        if contact.is_primary {
            self.clear_primary(now);
        }
        self.contacts.push(contact);
        Ok(&self.contacts[self.contacts.len() - 1])
    }

    pub fn update(
        &mut self,
        id: u64,
        update: ContactUpdate,
        now: DateTime<Utc>,
    ) -> Result<&EmergencyContact, ContactError> {
        let idx = self.index_of(id)?;

        // Validate everything before touching the book.
        let name = update.name.as_deref().map(|v| required(v, "name")).transpose()?;
        let phone = update
            .phone_number
            .as_deref()
            .map(|v| required(v, "phoneNumber"))
            .transpose()?;
        let relationship = update
            .relationship
            .as_deref()
            .map(|v| required(v, "relationship"))
            .transpose()?;

        if update.is_primary == Some(true) {
            self.clear_primary(now);
        }

        let contact = &mut self.contacts[idx];
        if let Some(name) = name {
            contact.name = name;
        }
        if let Some(phone) = phone {
            contact.phone_number = phone;
        }
        if let Some(relationship) = relationship {
            contact.relationship = relationship;
        }
        if let Some(primary) = update.is_primary {
            contact.is_primary = primary;
        }
        if let Some(active) = update.is_active {
            contact.is_active = active;
        }
        contact.updated_at = now;
        Ok(&self.contacts[idx])
    }

    pub fn set_primary(&mut self, id: u64, now: DateTime<Utc>) -> Result<&EmergencyContact, ContactError> {
        self.update(
            id,
            ContactUpdate {
                is_primary: Some(true),
                ..ContactUpdate::default()
            },
            now,
        )
    }

    pub fn remove(&mut self, id: u64) -> Result<EmergencyContact, ContactError> {
        let idx = self.index_of(id)?;
        Ok(self.contacts.remove(idx))
    }

    pub fn get(&self, id: u64) -> Option<&EmergencyContact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn primary(&self) -> Option<&EmergencyContact> {
        self.contacts.iter().find(|c| c.is_primary)
    }

    /// Active contacts, primary first, otherwise in insertion order.
    pub fn active(&self) -> Vec<&EmergencyContact> {
        let mut active: Vec<_> = self.contacts.iter().filter(|c| c.is_active).collect();
        active.sort_by_key(|c| !c.is_primary);
        active
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn next_free_id(&self) -> u64 {
        let after_highest = self.contacts.iter().map(|c| c.id + 1).max().unwrap_or(1);
        self.next_id.max(after_highest)
    }

    fn index_of(&self, id: u64) -> Result<usize, ContactError> {
        self.contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or(ContactError::NotFound(id))
    }

    fn clear_primary(&mut self, now: DateTime<Utc>) {
        for contact in self.contacts.iter_mut().filter(|c| c.is_primary) {
            contact.is_primary = false;
            contact.updated_at = now;
        }
    }
}

/// Where the user was when they raised an SOS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosLocation {
    pub point: GeoPoint,
    pub accuracy_m: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl SosLocation {
    pub fn new(point: GeoPoint, captured_at: DateTime<Utc>) -> Self {
        Self {
            point,
            accuracy_m: None,
            captured_at,
        }
    }

    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.point.latitude(),
            self.point.longitude()
        )
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.captured_at <= max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, primary: bool) -> ContactDraft {
        ContactDraft {
            name: name.to_string(),
            phone_number: "+911234567890".to_string(),
            relationship: "Sibling".to_string(),
            is_primary: primary,
        }
    }

    #[test]
    fn test_add_trims_and_validates() {
        let mut book = ContactBook::new("user-1");
        let now = Utc::now();

        let contact = book.add(draft("  Asha  ", false), now).unwrap();
        assert_eq!(contact.name, "Asha");
        assert!(contact.is_active);
        assert_eq!(contact.user_id, "user-1");

        let err = book.add(draft("   ", false), now).unwrap_err();
        assert_eq!(err, ContactError::MissingField("name"));
        assert_eq!(book.contacts.len(), 1);
    }

    #[test]
    fn test_single_primary_per_user() {
        let mut book = ContactBook::new("user-1");
        let now = Utc::now();

        let first = book.add(draft("A", true), now).unwrap().id;
        let second = book.add(draft("B", true), now).unwrap().id;
        assert!(!book.get(first).unwrap().is_primary);
        assert_eq!(book.primary().unwrap().id, second);

        book.set_primary(first, now).unwrap();
        assert_eq!(book.primary().unwrap().id, first);
        assert_eq!(book.contacts.iter().filter(|c| c.is_primary).count(), 1);
    }

    #[test]
    fn test_active_orders_primary_first() {
        let mut book = ContactBook::new("user-1");
        let now = Utc::now();
        let a = book.add(draft("A", false), now).unwrap().id;
        let b = book.add(draft("B", false), now).unwrap().id;
        let c = book.add(draft("C", true), now).unwrap().id;

        book.update(
            a,
            ContactUpdate {
                is_active: Some(false),
                ..ContactUpdate::default()
            },
            now,
        )
        .unwrap();

        let ids: Vec<u64> = book.active().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c, b]);
    }

    #[test]
    fn test_update_and_remove_unknown() {
        let mut book = ContactBook::new("user-1");
        let now = Utc::now();
        assert_eq!(book.remove(9).unwrap_err(), ContactError::NotFound(9));
        assert!(book
            .update(9, ContactUpdate::default(), now)
            .is_err());

        let id = book.add(draft("A", false), now).unwrap().id;
        let bad = ContactUpdate {
            phone_number: Some(" ".to_string()),
            ..ContactUpdate::default()
        };
        assert_eq!(
            book.update(id, bad, now).unwrap_err(),
            ContactError::MissingField("phoneNumber")
        );
        assert_eq!(book.remove(id).unwrap().name, "A");
        assert!(book.is_empty());
    }

    #[test]
    fn test_location_link_and_freshness() {
        let now = Utc::now();
        let loc = SosLocation::new(GeoPoint::new(12.5, 77.25).unwrap(), now - Duration::minutes(4));
        assert_eq!(loc.maps_url(), "https://www.google.com/maps?q=12.5,77.25");
        assert!(loc.is_fresh(now, Duration::minutes(5)));
        assert!(!loc.is_fresh(now + Duration::minutes(2), Duration::minutes(5)));
    }
}
