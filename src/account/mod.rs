//! Account traits and structs
use crate::{AccountID, UserID};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub(crate) mod balance;
pub(crate) mod bank_account;
pub(crate) mod transactions;

pub use bank_account::BankAccount;
pub use transactions::{TransKind, TransRecord};

/// Represent basic account information and balance
pub trait Account {
    /// identifier of account
    fn account_id(&self) -> AccountID;
    /// identifier of user owning the account
    fn owner(&self) -> UserID;
    /// savings or current
    fn account_type(&self) -> AccountType;
    /// amount of money in account
    fn balance(&self) -> Decimal;
    /// is account blocked
    fn is_blocked(&self) -> bool;
    /// number of recorded transactions
    fn transactions_count(&self) -> usize;

    /// status derived from [`Account::is_blocked`]
    fn status(&self) -> AccountStatus {
        if self.is_blocked() {
            AccountStatus::Blocked
        } else {
            AccountStatus::Active
        }
    }
}

/// Point in time copy of an account without its history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    account_id: AccountID,
    owner: UserID,
    account_type: AccountType,
    balance: Decimal,
    blocked: bool,
    transactions_count: usize,
}

impl<T: Account> From<&T> for AccountSnapshot {
    fn from(acc: &T) -> Self {
        Self {
            account_id: acc.account_id(),
            owner: acc.owner(),
            account_type: acc.account_type(),
            balance: acc.balance(),
            blocked: acc.is_blocked(),
            transactions_count: acc.transactions_count(),
        }
    }
}

impl Account for AccountSnapshot {
    fn account_id(&self) -> AccountID {
        self.account_id
    }

    fn owner(&self) -> UserID {
        self.owner
    }

    fn account_type(&self) -> AccountType {
        self.account_type
    }

    fn balance(&self) -> Decimal {
        self.balance
    }

    fn is_blocked(&self) -> bool {
        self.blocked
    }

    fn transactions_count(&self) -> usize {
        self.transactions_count
    }
}

/// Allowed account types
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Savings,
    Current,
}

impl AccountType {
    /// name used in API and csv
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "Savings",
            AccountType::Current => "Current",
        }
    }
}

/// account type name was not recognized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid account type")]
pub struct UnknownAccountType;

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "current" => Ok(AccountType::Current),
            _ => Err(UnknownAccountType),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle state
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => f.write_str("ACTIVE"),
            AccountStatus::Blocked => f.write_str("BLOCKED"),
        }
    }
}
