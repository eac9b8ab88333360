//! Authentication error types.

use credimo_core::error::CredimoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Uniform failure for unknown email, bad password and inactive
    /// account; the caller cannot distinguish the cases.
    #[error("credenciais inválidas")]
    InvalidCredentials,

    #[error("o token expirou")]
    TokenExpired,

    #[error("token inválido: {0}")]
    TokenInvalid(String),

    #[error("erro de criptografia: {0}")]
    Crypto(String),
}

impl From<AuthError> for CredimoError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => CredimoError::InvalidCredentials,
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                CredimoError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => CredimoError::Crypto(msg),
        }
    }
}
