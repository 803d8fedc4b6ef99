use anyhow::anyhow;
use argon2::{
    password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Length rule applied at signup. Counted in characters, not bytes.
pub fn check_strength(plain: &str) -> AppResult<()> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Argon2id PHC string with a fresh salt.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| AppError::Internal(anyhow!("argon2 hash failed: {e}")))
}

/// `Ok(false)` on mismatch; an unreadable stored hash is an internal error.
pub fn verify_password(plain: &str, stored: &str) -> AppResult<bool> {
    let phc = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(anyhow!("stored password hash unreadable: {e}")))?;
    match Argon2::default().verify_password(plain.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(anyhow!("argon2 verify failed: {e}"))),
    }
}
