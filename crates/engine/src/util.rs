//! Internal helpers for input normalization and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const MAX_CODE_LEN: usize = 10;
const MAX_USERNAME_LEN: usize = 64;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidInput(format!("invalid {label} id")))
}

/// Normalize a currency code: trimmed, upper-case ASCII alphanumerics.
pub(crate) fn normalize_code(value: &str) -> ResultEngine<String> {
    let code = value.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(EngineError::InvalidInput(
            "currency code must not be empty".to_string(),
        ));
    }
    if code.len() > MAX_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::InvalidInput(format!(
            "invalid currency code: {code}"
        )));
    }
    Ok(code)
}

/// Normalize a username as typed by a human: NFC, trimmed, without the
/// leading `@` chat clients show.
pub(crate) fn normalize_username(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    let username: String = trimmed.nfc().collect();
    if username.is_empty() {
        return Err(EngineError::InvalidInput(
            "username must not be empty".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN || username.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidInput(format!(
            "invalid username: {username}"
        )));
    }
    Ok(username)
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}
