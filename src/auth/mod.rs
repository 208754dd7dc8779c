pub mod token;

use crate::models::UserProfile;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use token::{read_claims, token_expiry, Claims};

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password. Must not be empty.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new account registration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    /// Must be at least 8 characters long.
    #[validate(length(min = 8))]
    pub password1: String,
    #[validate(must_match = "password1")]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Response to a successful login or registration.
///
/// Accepts both the short (`access`/`refresh`) and long (`access_token`/`refresh_token`)
/// field names used by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access")]
    pub access_token: String,
    #[serde(alias = "refresh")]
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Body of `POST /auth/token/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refresh")]
    pub refresh_token: String,
}

/// Response of the refresh exchange. A new refresh token is only present when the
/// server rotates refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(alias = "access_token", rename = "access")]
    pub access_token: String,
    #[serde(alias = "refresh_token", rename = "refresh", default)]
    pub refresh_token: Option<String>,
}
