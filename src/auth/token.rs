use crate::error::ClientError;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The claims the client cares about inside an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Identifier of the user the token was issued to (SimpleJWT `user_id`).
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Reads the claims of an access token without verifying its signature.
///
/// The client never holds the signing key. The claims are only used to learn when
/// the token expires so it can be refreshed before being sent.
///
/// # Returns
/// The decoded `Claims`, or `ClientError::Decode` when the token is not a JWT or
/// carries no `exp` claim.
pub fn read_claims(token: &str) -> Result<Claims, ClientError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Expiry of an access token, or `None` for opaque (non-JWT) tokens.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    match read_claims(token) {
        Ok(claims) => Utc.timestamp_opt(claims.exp, 0).single(),
        Err(e) => {
            log::debug!("Access token carries no readable expiry: {}", e);
            None
        }
    }
}
