use super::balance::Balance;
use super::transactions::TransRecord;
use super::{Account, AccountType};
use crate::{amount::Amount, errors::AccountErr, AccountID, TransID, UserID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Account current balance and transactions history
#[derive(Debug, Clone)]
pub struct BankAccount {
    account_id: AccountID,
    owner: UserID,
    account_type: AccountType,
    // ordered by time of recording, oldest first
    trans_history: Vec<TransRecord>,
    balance: Balance,
    blocked: bool,
}

impl BankAccount {
    /// Create new empty active [`BankAccount`] for `owner`
    pub fn new(account_id: AccountID, owner: UserID, account_type: AccountType) -> Self {
        Self {
            account_id,
            owner,
            account_type,
            trans_history: Vec::new(),
            balance: Default::default(),
            blocked: false,
        }
    }

    #[cfg(test)]
    /// New account with balance 100.00 built from one deposit
    pub fn new_test_account(account_id: AccountID) -> Self {
        let mut a = BankAccount::new(account_id, 1, AccountType::Savings);
        a.record_deposit(account_id * 1000, Amount::try_from(Decimal::new(100, 0)).unwrap(), Utc::now())
            .unwrap();
        a
    }

    /// Recorded transactions, oldest first
    pub fn history(&self) -> &[TransRecord] {
        &self.trans_history
    }

    /// increase balance and record a deposit
    ///
    /// On error neither balance nor history is changed.
    pub(crate) fn record_deposit(
        &mut self,
        new_trans_id: TransID,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> Result<(), AccountErr> {
        self.check_blocked()?;
        self.balance.try_deposit(&amount)?;
        self.trans_history
            .push(TransRecord::deposit(new_trans_id, amount, at));
        Ok(())
    }

    /// mark account as blocked, no money can enter or leave it afterwards
    pub(crate) fn block(&mut self) {
        self.blocked = true;
    }

    pub(crate) fn check_blocked(&self) -> Result<(), AccountErr> {
        if self.blocked {
            Err(AccountErr::Blocked)
        } else {
            Ok(())
        }
    }
}

/// Move `amount` from `src` to `dst` and record debit and credit legs sharing `at`.
///
/// Every check runs before the first mutation so on error both accounts are untouched.
pub(crate) fn transfer_between(
    src: &mut BankAccount,
    dst: &mut BankAccount,
    (debit_id, credit_id): (TransID, TransID),
    amount: Amount,
    at: DateTime<Utc>,
) -> Result<(), AccountErr> {
    src.check_blocked()?;
    dst.check_blocked()?;
    dst.balance.can_accept(&amount)?;

    src.balance.try_withdraw(&amount)?;
    dst.balance.try_deposit(&amount)?;

    src.trans_history
        .push(TransRecord::debit(debit_id, amount, at, dst.account_id));
    dst.trans_history
        .push(TransRecord::credit(credit_id, amount, at, src.account_id));
    Ok(())
}

impl Account for BankAccount {
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
        self.balance.available()
    }

    fn is_blocked(&self) -> bool {
        self.blocked
    }

    fn transactions_count(&self) -> usize {
        self.trans_history.len()
    }
}
