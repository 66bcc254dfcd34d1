use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use domains::{AppError, CredentialHasher, Result};

/// Argon2 password hashing with a fresh random salt per hash.
pub struct ArgonHasher;

impl CredentialHasher for ArgonHasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(AppError::internal)?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored hash. An unparsable stored hash
    /// counts as a failed verification, not an error.
    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!("failed to parse password hash: {}", err);
                return Ok(false);
            }
        };

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
