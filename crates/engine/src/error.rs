//! The module contains the errors the engine can throw.
//!
//! Budget errors:
//!
//! - [`InvalidAmount`] thrown when an amount is not a positive number.
//! - [`NoBudgetFound`] thrown when a user has no budget yet.
//! - [`InsufficientBudget`] thrown when a spend exceeds the remaining budget.
//! - [`InvariantViolation`] thrown when a write would desync the derived
//!   balance fields.
//!
//! Record access never distinguishes "missing" from "owned by someone else":
//! both are [`NotFoundOrUnauthorized`].
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`NoBudgetFound`]: EngineError::NoBudgetFound
//!  [`InsufficientBudget`]: EngineError::InsufficientBudget
//!  [`InvariantViolation`]: EngineError::InvariantViolation
//!  [`NotFoundOrUnauthorized`]: EngineError::NotFoundOrUnauthorized
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("No budget found: {0}")]
    NoBudgetFound(String),
    #[error("Insufficient budget: {0}")]
    InsufficientBudget(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("\"{0}\" not found")]
    NotFoundOrUnauthorized(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable, machine readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "InvalidAmount",
            Self::NoBudgetFound(_) => "NoBudgetFound",
            Self::InsufficientBudget(_) => "InsufficientBudget",
            Self::InvariantViolation(_) => "InvariantViolation",
            Self::NotFoundOrUnauthorized(_) => "NotFoundOrUnauthorized",
            Self::Validation(_) => "ValidationError",
            Self::ExistingKey(_) => "AlreadyExists",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::Forbidden(_) => "Forbidden",
            Self::Conflict(_) => "Conflict",
            Self::Database(_) => "InternalError",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::NoBudgetFound(a), Self::NoBudgetFound(b)) => a == b,
            (Self::InsufficientBudget(a), Self::InsufficientBudget(b)) => a == b,
            (Self::InvariantViolation(a), Self::InvariantViolation(b)) => a == b,
            (Self::NotFoundOrUnauthorized(a), Self::NotFoundOrUnauthorized(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
