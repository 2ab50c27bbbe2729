//! Internal helpers for input validation and credential handling.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every write path enforces the same rules.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{EngineError, ResultEngine};

/// Shortest accepted username, in characters.
pub(crate) const USERNAME_MIN_CHARS: usize = 3;

/// Trim a required text field, rejecting blanks.
pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_username(value: &str) -> ResultEngine<String> {
    let username = normalize_required(value, "username")?;
    if username.chars().count() < USERNAME_MIN_CHARS {
        return Err(EngineError::Validation(format!(
            "username must be at least {USERNAME_MIN_CHARS} characters"
        )));
    }
    Ok(username)
}

/// Emails are compared case-insensitively, so they are stored lower-cased.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = normalize_required(value, "email")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(EngineError::Validation(format!("invalid email: {email}"))),
    }
}

/// Hash a password into a PHC string.
pub(crate) fn hash_password(password: &str) -> ResultEngine<String> {
    if password.is_empty() {
        return Err(EngineError::Validation("password is required".to_string()));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Validation(format!("cannot hash password: {err}")))
}

pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::error!("stored password hash is unreadable: {err}");
            false
        }
    }
}
