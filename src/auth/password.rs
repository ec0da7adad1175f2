use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Well-formed cost-10 hash that no password matches. Verifying against it
/// keeps unknown-account logins as slow as wrong-password ones.
pub const DUMMY_HASH: &str = "$2b$10$Q2q7Yb0Xn1Lk8sVwTz3pHeJm4rG8vPq2Wd6Xk0Nz5Lb7Yt3Hs9FaC";

/// Hash a plain-text password for storage on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// Compare a login attempt against a stored hash. A malformed hash counts
/// as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false)).await?;
    Ok(matched)
}
