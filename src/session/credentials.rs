use super::storage::{MemoryStorage, SessionStorage, StoredSession};
use crate::auth::token_expiry;
use crate::error::ClientError;
use crate::models::UserProfile;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Access and refresh credentials of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Read from the access token's `exp` claim; `None` for opaque tokens.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = token_expiry(&access_token);
        Self {
            access_token,
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

#[derive(Debug, Clone)]
struct Session {
    credential: Credential,
    profile: UserProfile,
}

/// Owns the credentials and the user profile.
///
/// Consumers ask for the current value every time they need it and never keep a
/// copy, so nobody sends a token that a refresh has already replaced. Every write
/// goes to durable storage before the in-memory copy changes.
pub struct CredentialStore {
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Option<Session>>,
}

impl CredentialStore {
    /// Opens the store, restoring whatever session the storage holds.
    pub fn open(storage: Arc<dyn SessionStorage>) -> Result<Self, ClientError> {
        let session = storage.load()?.map(|stored| Session {
            credential: Credential::new(stored.access_token, stored.refresh_token),
            profile: stored.user,
        });
        if let Some(session) = &session {
            log::info!("Restored session for {}", session.profile.email);
        }
        Ok(Self {
            storage,
            session: RwLock::new(session),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            session: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<Credential> {
        self.session.read().as_ref().map(|s| s.credential.clone())
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.session.read().as_ref().map(|s| s.profile.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.credential.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.credential.refresh_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    /// Stores a credential together with its profile.
    pub fn set(&self, credential: Credential, profile: UserProfile) -> Result<(), ClientError> {
        let mut session = self.session.write();
        self.storage.save(&StoredSession {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            user: profile.clone(),
        })?;
        *session = Some(Session {
            credential,
            profile,
        });
        Ok(())
    }

    /// Replaces the profile of the current session, e.g. after `GET /auth/user`.
    pub fn set_profile(&self, profile: UserProfile) -> Result<(), ClientError> {
        let mut guard = self.session.write();
        let current = guard.as_mut().ok_or(ClientError::SessionExpired)?;

        self.storage.save(&StoredSession {
            access_token: current.credential.access_token.clone(),
            refresh_token: current.credential.refresh_token.clone(),
            user: profile.clone(),
        })?;
        current.profile = profile;
        Ok(())
    }

    /// Swaps in a refreshed access token, keeping the profile. Only the refresh
    /// exchange calls this.
    pub(crate) fn update_access(
        &self,
        access_token: String,
        rotated_refresh: Option<String>,
    ) -> Result<Credential, ClientError> {
        let mut guard = self.session.write();
        let current = guard.as_ref().ok_or(ClientError::SessionExpired)?;

        let refresh_token = rotated_refresh.unwrap_or_else(|| current.credential.refresh_token.clone());
        let credential = Credential::new(access_token, refresh_token);
        let profile = current.profile.clone();

        self.storage.save(&StoredSession {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            user: profile.clone(),
        })?;
        *guard = Some(Session {
            credential: credential.clone(),
            profile,
        });
        Ok(credential)
    }

    /// Forgets the credential and profile, in memory and on disk.
    ///
    /// The in-memory copy is dropped even if erasing the storage fails.
    pub fn clear(&self) -> Result<(), ClientError> {
        let mut session = self.session.write();
        session.take();
        self.storage.erase()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
