//! Credential hashing off the async runtime
//!
//! PBKDF2 at 120k iterations takes long enough to stall a runtime worker,
//! so both directions run on the blocking pool.

use platform::password::{ClearTextPassword, DUMMY_HASH, HashedPassword};

use crate::error::{AuthError, AuthResult};

pub async fn hash_password(password: ClearTextPassword) -> AuthResult<HashedPassword> {
    tokio::task::spawn_blocking(move || password.hash())
        .await
        .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))?
        .map_err(|e| AuthError::Validation(e.to_string()))
}

/// `false` for a wrong password or a malformed stored hash
pub async fn verify_password(
    stored: HashedPassword,
    password: ClearTextPassword,
) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || stored.verify(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))
}

/// Spend the same work as a real verification when there is no user to
/// verify against, so response time does not reveal registered emails.
pub async fn verify_against_dummy(password: ClearTextPassword) -> AuthResult<()> {
    let dummy = HashedPassword::parse(DUMMY_HASH)
        .map_err(|e| AuthError::Internal(format!("Dummy hash unusable: {e}")))?;
    verify_password(dummy, password).await?;
    Ok(())
}
