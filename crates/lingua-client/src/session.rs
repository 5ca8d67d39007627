//! Local session state
//!
//! The access value, the refresh value and the subject snapshot are stored
//! and cleared together.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::{CredentialPair, Role, SubjectId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Who the session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSnapshot {
    pub subject_id: SubjectId,
    pub role: Role,
}

/// Everything the client keeps between requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub subject: SubjectSnapshot,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn from_pair(pair: &CredentialPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            subject: SubjectSnapshot {
                subject_id: pair.subject_id,
                role: pair.role,
            },
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }

    /// Whether the refresh value is past its expiry at `now`
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_expires_at <= now
    }
}

/// Durable home of the session
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn load(&self) -> Result<Option<StoredSession>, SessionError>;

    /// Replace the stored session as one unit
    async fn save(&self, session: &StoredSession) -> Result<(), SessionError>;

    /// Remove all stored items; clearing an empty store succeeds
    async fn clear(&self) -> Result<(), SessionError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.session.lock().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.session.lock() = None;
        Ok(())
    }
}

/// JSON file store with atomic replacement
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique sibling temp path so concurrent saves never share a file
    fn temp_path(&self) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let json = serde_json::to_vec_pretty(session)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
