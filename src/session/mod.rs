//! Credential Store: the single owner of the session's credentials and profile.

pub mod credentials;
pub mod storage;

pub use credentials::{Credential, CredentialStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StoredSession};
