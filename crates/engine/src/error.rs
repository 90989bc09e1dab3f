//! The module contains the errors the ledger can return.
//!
//! Validation errors ([`InvalidDescription`], [`InvalidAmount`],
//! [`InvalidCategory`], [`UnsupportedCurrency`]) come from the input helpers
//! and never from the reducer. [`NotLoaded`] guards every mutation issued
//! before the initial load has completed.
//!
//!  [`InvalidDescription`]: LedgerError::InvalidDescription
//!  [`InvalidAmount`]: LedgerError::InvalidAmount
//!  [`InvalidCategory`]: LedgerError::InvalidCategory
//!  [`UnsupportedCurrency`]: LedgerError::UnsupportedCurrency
//!  [`NotLoaded`]: LedgerError::NotLoaded
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Description is required")]
    InvalidDescription,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Category is required")]
    InvalidCategory,
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Ledger is not loaded yet")]
    NotLoaded,
    #[error("Ledger already loaded")]
    AlreadyLoaded,
    #[error("Saving \"{key}\" failed: {reason}")]
    SaveFailed { key: String, reason: String },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidDescription, Self::InvalidDescription) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCategory, Self::InvalidCategory) => true,
            (Self::UnsupportedCurrency(a), Self::UnsupportedCurrency(b)) => a == b,
            (Self::NotLoaded, Self::NotLoaded) => true,
            (Self::AlreadyLoaded, Self::AlreadyLoaded) => true,
            (
                Self::SaveFailed { key: a, reason: r },
                Self::SaveFailed { key: b, reason: s },
            ) => a == b && r == s,
            (Self::Gateway(a), Self::Gateway(b)) => a.to_string() == b.to_string(),
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Failures reported by a persistence gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
