//! Represents transactions
use crate::{amount::Amount, AccountID, TransID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represent a single immutable balance change of one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransRecord {
    id: TransID,
    kind: TransKind,
    amount: Amount,
    created_at: DateTime<Utc>,
    counterparty: Option<AccountID>,
}

impl TransRecord {
    pub(crate) fn deposit(id: TransID, amount: Amount, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: TransKind::Deposit,
            amount,
            created_at,
            counterparty: None,
        }
    }

    pub(crate) fn debit(
        id: TransID,
        amount: Amount,
        created_at: DateTime<Utc>,
        to: AccountID,
    ) -> Self {
        Self {
            id,
            kind: TransKind::Debit,
            amount,
            created_at,
            counterparty: Some(to),
        }
    }

    pub(crate) fn credit(
        id: TransID,
        amount: Amount,
        created_at: DateTime<Utc>,
        from: AccountID,
    ) -> Self {
        Self {
            id,
            kind: TransKind::Credit,
            amount,
            created_at,
            counterparty: Some(from),
        }
    }

    /// transaction identifier
    pub fn id(&self) -> TransID {
        self.id
    }

    /// deposit, debit or credit
    pub fn kind(&self) -> TransKind {
        self.kind
    }

    /// moved amount
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// moment the balance changed
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// other side of a transfer
    pub fn counterparty(&self) -> Option<AccountID> {
        self.counterparty
    }
}

/// Represent one of the kinds of balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransKind {
    /// external money entering the account
    Deposit,
    /// outgoing leg of a transfer
    Debit,
    /// incoming leg of a transfer
    Credit,
}

impl fmt::Display for TransKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransKind::Deposit => f.write_str("deposit"),
            TransKind::Debit => f.write_str("debit"),
            TransKind::Credit => f.write_str("credit"),
        }
    }
}
