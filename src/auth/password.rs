//! Password hashing
//!
//! bcrypt with a per-hash random salt. Hashing is CPU-bound, so both
//! operations run on the blocking thread pool.

use crate::error::AppError;

/// Hash a plaintext password
pub async fn hash_password(plaintext: &str, cost: u32) -> Result<String, AppError> {
    let plaintext = plaintext.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(AppError::from)
}

/// Verify a plaintext password against a stored hash
///
/// Returns `false` for a mismatch and for a malformed hash.
pub async fn verify_password(plaintext: &str, hashed: &str) -> bool {
    let plaintext = plaintext.to_owned();
    let hashed = hashed.to_owned();
    match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hashed)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(error)) => {
            tracing::warn!(%error, "Stored password hash could not be parsed");
            false
        }
        Err(error) => {
            tracing::error!(%error, "Password verification task failed");
            false
        }
    }
}
