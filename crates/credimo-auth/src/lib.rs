//! Credimo Auth — password verification, bearer-token issuance and
//! validation, and impersonation.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, RegisterInput};
pub use token::TokenClaims;
