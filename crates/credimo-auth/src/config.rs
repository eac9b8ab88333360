//! Authentication configuration.

/// Configuration for token signing and verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 signing.
    pub token_secret: String,
    /// Bearer-token lifetime in hours.
    pub token_lifetime_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_lifetime_hours: 24,
        }
    }
}
