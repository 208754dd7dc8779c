#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "A client for a project/task-tracking REST service. It keeps the user's session"]
#![doc = "alive across concurrent requests (single-flight token refresh, retry at most once)"]
#![doc = "and keeps a local board of tasks in sync with the server, applying column moves"]
#![doc = "optimistically and rolling them back when the server refuses."]
#![doc = "The `taskboard` binary (`main.rs`) is a thin command-line front end over it."]

pub mod api;
pub mod auth;
pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;

pub use board::{BoardStore, DragEvent, DragOutcome};
pub use client::{ApiClient, ApiRequest, SessionEvent};
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{Credential, CredentialStore};
