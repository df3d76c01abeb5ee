use thiserror::Error;

/// Every failure the bank can report.
///
/// All variants are recoverable at the controller boundary: the console maps
/// each one to a message and returns to the menu it came from.
#[derive(Error, Debug)]
pub enum BankError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("card not found")]
    NotFound,
    #[error("wrong card number or PIN")]
    AuthenticationFailed,
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("cannot transfer to the same card")]
    SelfTransfer,
    #[error("card number fails the checksum")]
    InvalidCardNumber,
    #[error("card number already exists")]
    UniquenessViolation,
    #[error("no free card number after {0} attempts")]
    ResourceExhausted(u32),
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("no active session")]
    NotLoggedIn,
    #[error("a session is already active")]
    AlreadyLoggedIn,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BankError>;

impl From<serde_json::Error> for BankError {
    fn from(e: serde_json::Error) -> Self {
        BankError::Internal(format!("record codec: {e}"))
    }
}

impl From<csv::Error> for BankError {
    fn from(e: csv::Error) -> Self {
        BankError::Internal(format!("csv: {e}"))
    }
}

impl From<tokio::task::JoinError> for BankError {
    fn from(e: tokio::task::JoinError) -> Self {
        BankError::Internal(format!("blocking task: {e}"))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for BankError {
    fn from(e: rocksdb::Error) -> Self {
        BankError::StoreUnavailable(e.to_string())
    }
}
