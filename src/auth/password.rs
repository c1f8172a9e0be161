use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::sync::OnceCell;
use tracing::error;

fn hash_blocking(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_blocking(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hashes off the async executor; Argon2 is deliberately slow.
pub async fn hash_password(plain: &str) -> anyhow::Result<String> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&plain))
        .await
        .context("password hashing task")?
}

pub async fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&plain, &hash))
        .await
        .context("password verification task")?
}

static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Burns one verification against a throwaway hash, so a lookup miss costs
/// the same as a wrong password.
pub async fn verify_dummy(plain: &str) -> anyhow::Result<()> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| hash_password("unknown-account"))
        .await?;
    verify_password(plain, hash).await?;
    Ok(())
}
