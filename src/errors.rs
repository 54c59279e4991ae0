//! Possible errors

use crate::{amount::AmountErr, AccountID};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Group errors for account balance
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BalanceErr {
    #[error("insufficient balance")]
    NotEnoughAvailableFunds,
    #[error("balance would exceed the supported range")]
    Overflow,
}

/// Group all errors that can occurs within account module
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountErr {
    #[error("account money change error")]
    AccMoney(#[from] BalanceErr),
    #[error("improper amount")]
    Amount(#[from] AmountErr),
    #[error("account is blocked")]
    Blocked,
}

/// Errors of ledger wide operations
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerErr {
    #[error("account {0} not found")]
    UnknownAccount(AccountID),
    #[error("source and destination account must differ")]
    SameAccount,
    #[error(transparent)]
    Account(#[from] AccountErr),
}

impl From<BalanceErr> for LedgerErr {
    fn from(e: BalanceErr) -> Self {
        AccountErr::from(e).into()
    }
}

impl From<AmountErr> for LedgerErr {
    fn from(e: AmountErr) -> Self {
        AccountErr::from(e).into()
    }
}

/// Errors of user registration, login and sessions
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthErr {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    UnknownSession,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Kind of [`BankError`], carried in API error bodies so clients can rebuild the error
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAccount,
    InvalidAmount,
    InsufficientFunds,
    Validation,
    Unauthorized,
    Server,
}

/// Errors surfaced to API users. Every variant carries the message shown to the user.
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("{0}")]
    InvalidAccount(String),
    #[error("{0}")]
    InvalidAmount(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Server(String),
}

impl BankError {
    /// kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::InvalidAccount(_) => ErrorKind::InvalidAccount,
            BankError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            BankError::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            BankError::Validation(_) => ErrorKind::Validation,
            BankError::Unauthorized(_) => ErrorKind::Unauthorized,
            BankError::Server(_) => ErrorKind::Server,
        }
    }

    /// rebuild error from its kind and message
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidAccount => BankError::InvalidAccount(message),
            ErrorKind::InvalidAmount => BankError::InvalidAmount(message),
            ErrorKind::InsufficientFunds => BankError::InsufficientFunds(message),
            ErrorKind::Validation => BankError::Validation(message),
            ErrorKind::Unauthorized => BankError::Unauthorized(message),
            ErrorKind::Server => BankError::Server(message),
        }
    }

    /// message shown to the user
    pub fn message(&self) -> &str {
        match self {
            BankError::InvalidAccount(m)
            | BankError::InvalidAmount(m)
            | BankError::InsufficientFunds(m)
            | BankError::Validation(m)
            | BankError::Unauthorized(m)
            | BankError::Server(m) => m,
        }
    }
}

impl From<LedgerErr> for BankError {
    fn from(e: LedgerErr) -> Self {
        match e {
            LedgerErr::UnknownAccount(_) => {
                BankError::InvalidAccount("Account not found or blocked".into())
            }
            LedgerErr::SameAccount => {
                BankError::InvalidAccount("Cannot transfer to the same account".into())
            }
            LedgerErr::Account(AccountErr::Blocked) => {
                BankError::InvalidAccount("Account not found or blocked".into())
            }
            LedgerErr::Account(AccountErr::AccMoney(BalanceErr::NotEnoughAvailableFunds)) => {
                BankError::InsufficientFunds("Insufficient balance".into())
            }
            LedgerErr::Account(AccountErr::AccMoney(BalanceErr::Overflow)) => {
                BankError::InvalidAmount("Amount exceeds account limit".into())
            }
            LedgerErr::Account(AccountErr::Amount(e)) => {
                BankError::InvalidAmount(format!("Invalid amount: {e}"))
            }
        }
    }
}

impl From<AuthErr> for BankError {
    fn from(e: AuthErr) -> Self {
        match e {
            AuthErr::Validation(msg) => BankError::Validation(msg),
            AuthErr::InvalidCredentials | AuthErr::UnknownSession => {
                BankError::Unauthorized(e.to_string())
            }
            AuthErr::Hashing(_) => BankError::Server("Server error".into()),
        }
    }
}
