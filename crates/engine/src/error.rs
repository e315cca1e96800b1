//! The module contains the errors the engine can return.
//!
//! Every ledger operation returns one of these kinds and never a
//! presentation-formatted message:
//!
//! - [`KeyNotFound`] when a user, currency or account does not exist.
//! - [`InsufficientFunds`] when a transfer would leave the sender negative.
//! - [`Unavailable`] when the store is busy; the operation can be retried.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Unavailable`]: EngineError::Unavailable
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Self transfer not allowed: {0}")]
    SelfTransfer(String),
    #[error("Currency not held: {0}")]
    CurrencyNotHeld(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns `true` when the failure is transient and the whole operation
    /// can be run again from scratch.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_transient(&err) {
            return Self::Unavailable(err.to_string());
        }
        Self::Database(err)
    }
}

fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(_) | DbErr::Exec(_) | DbErr::Query(_) => {
            let message = err.to_string().to_ascii_lowercase();
            message.contains("database is locked")
                || message.contains("database is busy")
                || message.contains("database table is locked")
        }
        _ => false,
    }
}

/// Map unique-constraint violations to [`EngineError::ExistingKey`].
///
/// Concurrent inserts that race past the existence checks end up here.
pub(crate) fn existing_on_conflict(err: DbErr, key: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(key.to_string()),
        _ => err.into(),
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::SelfTransfer(a), Self::SelfTransfer(b)) => a == b,
            (Self::CurrencyNotHeld(a), Self::CurrencyNotHeld(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnAcquireErr, RuntimeErr};

    use super::*;

    #[test]
    fn pool_timeout_is_retryable() {
        let err = EngineError::from(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert!(err.is_retryable());
    }

    #[test]
    fn locked_database_is_retryable() {
        let err = EngineError::from(DbErr::Exec(RuntimeErr::Internal(
            "database is locked".to_string(),
        )));
        assert!(matches!(err, EngineError::Unavailable(_)));
    }

    #[test]
    fn other_database_errors_are_not_retryable() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, EngineError::Database(_)));
        assert!(!err.is_retryable());
    }
}
