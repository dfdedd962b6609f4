use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::account::Account;
use crate::{DEFAULT_PASSWORD, DEFAULT_USERNAME};

/// Store filename inside the data directory
pub const USERS_FILENAME: &str = "users.json";

/// The full username -> Account mapping, loaded at startup and rewritten
/// as a whole after every mutation. Concurrent writers race with
/// last-write-wins; the temp-file rename only keeps each write internally
/// consistent.
#[derive(Debug)]
pub struct UserStore {
    accounts: BTreeMap<String, Account>,
    data_dir: PathBuf,
}

impl UserStore {
    /// Load the store from the data directory. A missing or unparseable
    /// file yields an empty mapping.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(USERS_FILENAME);
        let accounts = if path.exists() {
            let file = File::open(&path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).unwrap_or_default()
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            accounts,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Insert the default account if the store is empty and persist.
    /// Returns whether seeding happened, so the caller can announce the
    /// credentials exactly once.
    pub fn seed_default(&mut self) -> anyhow::Result<bool> {
        if !self.accounts.is_empty() {
            return Ok(false);
        }
        self.accounts
            .insert(DEFAULT_USERNAME.to_string(), Account::new(DEFAULT_PASSWORD));
        self.save()?;
        Ok(true)
    }

    /// Serialize the full mapping back to disk, replacing any prior value.
    pub fn save(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(USERS_FILENAME);
        let temp_path = self.data_dir.join(".users.tmp");

        // Write to temp file first, then rename for atomicity
        let file = File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.accounts)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    pub fn account_mut(&mut self, username: &str) -> Option<&mut Account> {
        self.accounts.get_mut(username)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All usernames, sorted.
    pub fn usernames(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }

    /// Create a new account and persist. Fails if the username is taken.
    pub fn create_account(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        if self.accounts.contains_key(username) {
            anyhow::bail!("user {} already exists", username);
        }
        self.accounts
            .insert(username.to_string(), Account::new(password));
        self.save()
    }

    /// Delete an account and all of its media, then persist. Fails if the
    /// username is unknown.
    pub fn delete_account(&mut self, username: &str) -> anyhow::Result<()> {
        if self.accounts.remove(username).is_none() {
            anyhow::bail!("user {} not found", username);
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{encode_data_url, MediaItem, MediaKind};
    use tempfile::tempdir;

    #[test]
    fn test_seed_default_on_empty_store() {
        let dir = tempdir().unwrap();
        let mut store = UserStore::load(dir.path()).unwrap();
        assert!(store.is_empty());

        assert!(store.seed_default().unwrap());
        let account = store.account(DEFAULT_USERNAME).unwrap();
        assert_eq!(account.password, DEFAULT_PASSWORD);
        assert!(account.media.is_empty());
        assert_eq!(account.storage_used, 0);
        assert_eq!(store.usernames(), vec![DEFAULT_USERNAME.to_string()]);

        // Second load sees the seeded account and does not seed again
        let mut store = UserStore::load(dir.path()).unwrap();
        assert!(!store.seed_default().unwrap());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = UserStore::load(dir.path()).unwrap();
        store.create_account("alice", "secret").unwrap();
        store.create_account("bob", "hunter2").unwrap();

        let bytes = b"fake video content";
        let item = MediaItem::new(
            "clip.mp4".to_string(),
            "video/mp4".to_string(),
            MediaKind::Video,
            bytes.len() as u64,
            encode_data_url("video/mp4", bytes),
        );
        let expected = item.clone();
        store.account_mut("alice").unwrap().push_item(item);
        store.save().unwrap();

        let reloaded = UserStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.usernames(), vec!["alice", "bob"]);
        let alice = reloaded.account("alice").unwrap();
        assert_eq!(alice.media, vec![expected]);
        assert_eq!(alice.storage_used, bytes.len() as u64);
        assert_eq!(reloaded.account("bob").unwrap().password, "hunter2");
    }

    #[test]
    fn test_malformed_store_loads_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(USERS_FILENAME), "{not json").unwrap();

        let mut store = UserStore::load(dir.path()).unwrap();
        assert!(store.is_empty());
        assert!(store.seed_default().unwrap());
    }

    #[test]
    fn test_create_and_delete_account() {
        let dir = tempdir().unwrap();
        let mut store = UserStore::load(dir.path()).unwrap();

        store.create_account("alice", "pw").unwrap();
        assert!(store.create_account("alice", "other").is_err());

        store.delete_account("alice").unwrap();
        assert!(store.delete_account("alice").is_err());
        assert!(store.is_empty());
    }
}
