//! Password hashing and verification using Argon2id.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// PHC hash of an arbitrary password, verified against when a login
/// targets an account with no stored hash. Keeps the missing-hash
/// path on the same Argon2 cost as the normal path.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// Verify a plaintext password against an Argon2id PHC-format hash.
/// Hashing itself lives with the user store (`credimo_db::hash_password`),
/// which owns the cost parameters.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("hash inválido: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("erro de verificação: {e}"))),
    }
}

/// Burn one Argon2 verification against a fixed dummy hash. Called on
/// the account-without-hash path so it costs the same as a real
/// verification.
pub fn verify_dummy(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;
    use credimo_db::hash_password;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2").unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }

    #[test]
    fn dummy_hash_is_well_formed() {
        // Must parse so the dummy verification actually runs Argon2.
        assert!(argon2::PasswordHash::new(DUMMY_HASH).is_ok());
    }
}
