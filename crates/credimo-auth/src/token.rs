//! Signed bearer-token issuance and verification.
//!
//! The token is opaque to clients; internally it is an HS256 JWT
//! carrying exactly: subject, email, role, expiration, and — for
//! impersonated sessions — the originating admin id and name.

use chrono::Utc;
use credimo_core::models::user::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Originating admin ID when this session is an impersonation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by_name: Option<String>,
}

/// Issue a signed token for a user session.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    role: Role,
    impersonator: Option<(Uuid, &str)>,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let exp = Utc::now().timestamp() + config.token_lifetime_hours as i64 * 3600;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp,
        impersonated_by: impersonator.map(|(id, _)| id.to_string()),
        impersonated_by_name: impersonator.map(|(_, name)| name.to_string()),
    };

    let key = EncodingKey::from_secret(config.token_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("falha ao assinar token: {e}")))
}

/// Decode and verify a token (signature and expiry).
pub fn decode_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(config.token_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["sub", "exp"]);

    jsonwebtoken::decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}
