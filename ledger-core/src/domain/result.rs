//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Account-level and money-level kinds propagate through the store and the
/// transfer coordinator unchanged, so callers can always match on the
/// original failure. Crypto failures are deliberately distinct from
/// `NotFound`: a missing key is not a missing record.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Currency mismatch: {0} vs {1}")]
    CurrencyMismatch(String, String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Unknown encryption key: {0}")]
    KeyNotFound(String),

    #[error("Compensation failed: {0}")]
    CompensationFailed(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid account error
    pub fn invalid_account(msg: impl Into<String>) -> Self {
        Self::InvalidAccount(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
