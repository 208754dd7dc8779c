//! Durable storage for the session record.
//!
//! The access token, the refresh token and the user profile are one record: they
//! are written together and erased together, never independently.

use crate::error::ClientError;
use crate::models::UserProfile;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// What survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, ClientError>;
    fn save(&self, session: &StoredSession) -> Result<(), ClientError>;
    fn erase(&self) -> Result<(), ClientError>;
}

/// Keeps the session in memory only. Used by tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<StoredSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn erase(&self) -> Result<(), ClientError> {
        self.slot.lock().take();
        Ok(())
    }
}

/// Stores the session as a JSON file.
///
/// Writes go to a temporary file in the same directory which is then renamed over
/// the target, so a crash mid-write never leaves half a session on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<StoredSession>(&data) {
            Ok(session) => {
                log::debug!("Loaded session for {} from {}", session.user.email, self.path.display());
                Ok(Some(session))
            }
            Err(e) => {
                // A partial record must never be used; treat it as logged out.
                log::warn!("Discarding unreadable session file {}: {}", self.path.display(), e);
                self.erase()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let data = serde_json::to_vec_pretty(session)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&data)?;
        temp_file
            .persist(&self.path)
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        log::debug!("Wrote session to {}", self.path.display());
        Ok(())
    }

    fn erase(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
