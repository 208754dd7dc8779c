//! Typed wrappers over the REST endpoints, one file per resource.
//!
//! Every call except login and registration goes through the authenticated
//! gateway, so each of them takes part in the refresh protocol.

pub mod auth;
pub mod comments;
pub mod projects;
pub mod sprints;
pub mod tasks;
