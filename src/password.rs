//! Bcrypt password hashing.
//!
//! Both calls are CPU-bound and block the calling thread; async callers
//! should run them on a blocking pool.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AuthError, AuthResult};

/// Hash with bcrypt at [`DEFAULT_COST`].
pub fn hash_password(password: &str) -> AuthResult<String> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash with an explicit bcrypt cost (4..=31).
pub fn hash_password_with_cost(password: &str, cost: u32) -> AuthResult<String> {
    hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// True when `plain` matches `hashed`.  A malformed hash counts as a
/// mismatch.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    match verify(plain, hashed) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::debug!(error = %e, "bcrypt verification failed");
            false
        }
    }
}
