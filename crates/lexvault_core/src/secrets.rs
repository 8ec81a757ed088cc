//! crates/lexvault_core/src/secrets.rs
//!
//! One-way salted hashing for vault PINs and the admin password.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

use crate::ports::PortError;

/// Hashes `secret` into an Argon2 PHC string with a fresh random salt.
pub fn hash_secret(secret: &str) -> Result<String, PortError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash secret: {:?}", e);
            PortError::Unexpected("Failed to hash secret".to_string())
        })
}

/// Checks `secret` against a stored PHC string. An unparsable hash never matches.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse stored hash: {:?}", e);
            false
        }
    }
}

/// [`hash_secret`] on the blocking pool, keeping Argon2 off the runtime threads.
pub async fn hash_secret_blocking(secret: &str) -> Result<String, PortError> {
    let secret = secret.to_string();
    tokio::task::spawn_blocking(move || hash_secret(&secret))
        .await
        .map_err(|e| PortError::Unexpected(format!("Hashing task failed: {}", e)))?
}

/// [`verify_secret`] on the blocking pool. A panicked task counts as a mismatch.
pub async fn verify_secret_blocking(secret: &str, hash: &str) -> bool {
    let (secret, hash) = (secret.to_string(), hash.to_string());
    match tokio::task::spawn_blocking(move || verify_secret(&secret, &hash)).await {
        Ok(matched) => matched,
        Err(e) => {
            error!("Verification task failed: {}", e);
            false
        }
    }
}
