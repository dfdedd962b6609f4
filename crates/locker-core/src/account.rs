use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::MediaItem;
use crate::MAX_STORAGE_SIZE;

/// A named user's credentials plus their owned media and quota usage.
///
/// Invariant: `storage_used` equals the sum of `size` over `media` after
/// any completed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Plaintext, compared by exact match
    pub password: String,
    /// Newest first
    pub media: Vec<MediaItem>,
    pub storage_used: u64,
}

impl Account {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            media: Vec::new(),
            storage_used: 0,
        }
    }

    /// Bytes still available under the account storage ceiling.
    pub fn remaining_quota(&self) -> u64 {
        MAX_STORAGE_SIZE.saturating_sub(self.storage_used)
    }

    /// Prepend a freshly uploaded item and charge its size.
    pub fn push_item(&mut self, item: MediaItem) {
        self.storage_used += item.size;
        self.media.insert(0, item);
    }

    pub fn find_item(&self, id: Uuid) -> Option<&MediaItem> {
        self.media.iter().find(|m| m.id == id)
    }

    /// Remove the item with the given id, refunding its size.
    /// Returns the removed item, or None if the id is unknown.
    pub fn remove_item(&mut self, id: Uuid) -> Option<MediaItem> {
        let idx = self.media.iter().position(|m| m.id == id)?;
        let item = self.media.remove(idx);
        self.storage_used -= item.size;
        Some(item)
    }
}
