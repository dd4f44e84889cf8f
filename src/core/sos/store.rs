//! Persistent storage for emergency contacts.
//!
//! One JSON file per user in the data directory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::model::ContactBook;

/// Manages contact books across users.
pub struct ContactStore {
    data_dir: PathBuf,
    cache: HashMap<String, ContactBook>,
}

impl ContactStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            cache: HashMap::new(),
        }
    }

    /// Path to a user's contact file. Anything outside [A-Za-z0-9_-] in the
    /// user id is replaced so ids can never escape the data directory.
    fn contacts_path(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.data_dir.join(format!("contacts_{}.json", safe))
    }

    /// Load a user's contacts, from cache or disk. Unknown users start empty.
    /// A file that exists but does not parse is an `InvalidData` error, so a
    /// later save can never overwrite it with an empty book.
    pub fn load(&mut self, user_id: &str) -> io::Result<&ContactBook> {
        Ok(&*self.get_mut(user_id)?)
    }

    pub fn get_mut(&mut self, user_id: &str) -> io::Result<&mut ContactBook> {
        if !self.cache.contains_key(user_id) {
            let path = self.contacts_path(user_id);
            let book = if path.exists() {
                let content = fs::read_to_string(&path)?;
                serde_json::from_str(&content).map_err(|e| {
                    log::warn!("Corrupt contact file {:?}: {}", path, e);
                    io::Error::new(io::ErrorKind::InvalidData, format!("{}: {}", path.display(), e))
                })?
            } else {
                ContactBook::new(user_id)
            };
            self.cache.insert(user_id.to_string(), book);
        }
        self.cache
            .get_mut(user_id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, user_id.to_string()))
    }

    /// Write a user's contacts to disk. No-op if never loaded.
    pub fn save(&self, user_id: &str) -> io::Result<()> {
        let Some(book) = self.cache.get(user_id) else {
            return Ok(());
        };

        fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(book)?;
        fs::write(self.contacts_path(user_id), content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sos::model::ContactDraft;
    use chrono::Utc;
    use tempfile::tempdir;

    fn draft(name: &str) -> ContactDraft {
        ContactDraft {
            name: name.to_string(),
            phone_number: "+15550100".to_string(),
            relationship: "Parent".to_string(),
            is_primary: true,
        }
    }

    #[test]
    fn test_store_save_and_load() {
        let dir = tempdir().unwrap();
        let mut store = ContactStore::new(dir.path().to_path_buf());

        store.get_mut("user-1").unwrap().add(draft("Ravi"), Utc::now()).unwrap();
        store.save("user-1").unwrap();

        let mut store2 = ContactStore::new(dir.path().to_path_buf());
        let book = store2.load("user-1").unwrap();
        assert_eq!(book.contacts.len(), 1);
        assert_eq!(book.contacts[0].name, "Ravi");
        assert!(book.contacts[0].is_primary);

        // Ids keep counting after a reload
        let next = store2.get_mut("user-1").unwrap().add(draft("Meera"), Utc::now()).unwrap().id;
        assert_eq!(next, 2);
    }

    #[test]
    fn test_unknown_user_starts_empty() {
        let dir = tempdir().unwrap();
        let mut store = ContactStore::new(dir.path().to_path_buf());
        assert!(store.load("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_user_id_cannot_escape_data_dir() {
        let dir = tempdir().unwrap();
        let store = ContactStore::new(dir.path().to_path_buf());
        let path = store.contacts_path("../../etc/passwd");
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[test]
    fn test_corrupt_file_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let mut store = ContactStore::new(dir.path().to_path_buf());
        for name in ["A", "B", "C"] {
            store.get_mut("u1").unwrap().add(draft(name), Utc::now()).unwrap();
        }
        store.save("u1").unwrap();

        // Damage the file with a trailing comma
        let path = dir.path().join("contacts_u1.json");
        let damaged = fs::read_to_string(&path).unwrap().trim_end().trim_end_matches('}').to_string() + ",}";
        fs::write(&path, &damaged).unwrap();

        let mut store2 = ContactStore::new(dir.path().to_path_buf());
        let err = store2.get_mut("u1").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(store2.load("u1").is_err());

        // Nothing was cached, so save has nothing to write
        store2.save("u1").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), damaged);
    }

    #[test]
    fn test_file_without_next_id_continues_numbering() {
        let dir = tempdir().unwrap();
        let now = Utc::now().to_rfc3339();
        let content = format!(
            r#"{{"userId":"u1","contacts":[{{"id":4,"userId":"u1","name":"Ravi","phoneNumber":"+1","relationship":"Parent","createdAt":"{now}","updatedAt":"{now}"}}]}}"#
        );
        fs::write(dir.path().join("contacts_u1.json"), content).unwrap();

        let mut store = ContactStore::new(dir.path().to_path_buf());
        assert_eq!(store.load("u1").unwrap().contacts.len(), 1);
        let id = store.get_mut("u1").unwrap().add(draft("Meera"), Utc::now()).unwrap().id;
        assert_eq!(id, 5);
        assert_eq!(store.load("u1").unwrap().contacts.len(), 2);
    }
}
