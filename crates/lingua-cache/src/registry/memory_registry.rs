//! In-process revocation registry.
//!
//! Only correct when a single authority process serves every refresh.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use lingua_core::{RepoResult, RevocationEntry, RevocationRegistry};

/// Revocation registry held in a concurrent map
#[derive(Clone, Debug, Default)]
pub struct MemoryRevocationRegistry {
    entries: Arc<DashMap<String, RevocationEntry>>,
}

impl MemoryRevocationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of a single entry
    #[must_use]
    pub fn get(&self, token_id: &str) -> Option<RevocationEntry> {
        self.entries.get(token_id).map(|e| e.value().clone())
    }
}

#[async_trait]
impl RevocationRegistry for MemoryRevocationRegistry {
    async fn insert(&self, entry: &RevocationEntry) -> RepoResult<bool> {
        // The shard lock is held across the check and the insert
        match self.entries.entry(entry.token_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(true)
            }
        }
    }

    async fn contains(&self, token_id: &str) -> RepoResult<bool> {
        Ok(self.entries.contains_key(token_id))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
