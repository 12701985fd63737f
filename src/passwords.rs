// ABOUTME: One-way password hashing and verification
// ABOUTME: bcrypt primary scheme with an argon2 legacy verification path
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Credential Hasher
//!
//! New hashes are bcrypt with a random salt, so equal plaintexts never
//! produce equal hash strings. Verification recognizes argon2 hashes as a
//! legacy scheme so stored credentials survive a hash migration, and a
//! malformed stored hash reports a verification failure instead of an
//! error.

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier as _};
use tracing::warn;

use crate::errors::{AppError, AppResult};

/// Hash a plaintext password for storage.
///
/// # Errors
/// Returns an internal error if the hashing backend fails; it does not
/// fail on any particular plaintext.
pub fn hash_password(plain: &str) -> AppResult<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal("password hashing failed").with_source(e))
}

/// Verify a plaintext against a stored hash.
///
/// Recognizes bcrypt (current) and argon2 (legacy) hash formats. A stored
/// hash in neither format is logged and reported as a failed
/// verification.
#[must_use]
pub fn verify_password(plain: &str, stored: &str) -> bool {
    if stored.starts_with("$argon2") {
        return PasswordHash::new(stored).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        });
    }

    match bcrypt::verify(plain, stored) {
        Ok(matched) => matched,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed; rejecting verification");
            false
        }
    }
}

/// [`hash_password`] on the blocking pool; bcrypt cost is deliberately
/// slow and must not stall the async executor.
///
/// # Errors
/// Returns an internal error if the blocking task fails or the hashing
/// backend errors.
pub async fn hash_password_blocking(plain: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AppError::internal("password hashing task failed").with_source(e))?
}

/// [`verify_password`] on the blocking pool.
///
/// # Errors
/// Returns an internal error if the blocking task fails.
pub async fn verify_password_blocking(plain: String, stored: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
        .await
        .map_err(|e| AppError::internal("password verification task failed").with_source(e))
}
