//! Registry of all bank accounts and the operations moving money between them.
//!
//! Every account lives behind its own mutex. Balance check and update happen in one critical
//! section, and a transfer holds the locks of both accounts, taken in ascending
//! [`AccountID`] order, so concurrent transfers can neither double-spend nor deadlock.

use crate::{
    account::{
        bank_account::transfer_between, Account, AccountSnapshot, AccountType, BankAccount,
        TransRecord,
    },
    amount::Amount,
    errors::LedgerErr,
    AccountID, TransID, UserID,
};
use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
    },
};

type SharedAccount = Arc<Mutex<BankAccount>>;

/// Outcome of a successful transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    /// transaction recorded on the source account
    pub debit_id: TransID,
    /// transaction recorded on the destination account
    pub credit_id: TransID,
}

/// In memory ledger of all accounts
#[derive(Debug)]
pub struct Ledger {
    accounts: RwLock<BTreeMap<AccountID, SharedAccount>>,
    next_account_id: AtomicU64,
    next_trans_id: AtomicU64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

// Data behind a poisoned lock is still consistent: accounts are mutated only after every
// fallible check passed.
fn lock(acc: &Mutex<BankAccount>) -> MutexGuard<'_, BankAccount> {
    acc.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Ledger {
    /// Create ledger without accounts
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            next_account_id: AtomicU64::new(1),
            next_trans_id: AtomicU64::new(1),
        }
    }

    /// Open new empty active account for `owner` and return its identifier
    pub fn open_account(&self, owner: UserID, account_type: AccountType) -> AccountID {
        let account_id = self.next_account_id.fetch_add(1, Ordering::Relaxed);
        let account = BankAccount::new(account_id, owner, account_type);

        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account_id, Arc::new(Mutex::new(account)));

        info!(
            "event=account_open module=ledger status=ok account={} owner={} type={}",
            account_id, owner, account_type
        );
        account_id
    }

    /// Add `amount` to the `owner`'s account and record a deposit
    pub fn deposit(
        &self,
        owner: UserID,
        account_id: AccountID,
        amount: Decimal,
    ) -> Result<TransID, LedgerErr> {
        let amount = Amount::try_from(amount)?;
        let shared = self.get_owned(owner, account_id)?;
        let mut account = lock(&shared);

        let trans_id = self.next_trans_id();
        account
            .record_deposit(trans_id, amount, Utc::now())
            .map_err(|e| {
                debug!("event=deposit module=ledger status=rejected account={account_id} reason={e}");
                e
            })?;

        info!(
            "event=deposit module=ledger status=ok account={} amount={} trans={}",
            account_id, *amount, trans_id
        );
        Ok(trans_id)
    }

    /// Atomically move `amount` from the `owner`'s account `from` to any active account `to`.
    ///
    /// Either both balances change and a debit and a credit record sharing one timestamp are
    /// appended, or nothing changes.
    pub fn transfer(
        &self,
        owner: UserID,
        from: AccountID,
        to: AccountID,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerErr> {
        let amount = Amount::try_from(amount)?;
        if from == to {
            return Err(LedgerErr::SameAccount);
        }

        let src = self.get_owned(owner, from)?;
        let dst = self.get(to)?;

        let mut src_acc;
        let mut dst_acc;
        if from < to {
            src_acc = lock(&src);
            dst_acc = lock(&dst);
        } else {
            dst_acc = lock(&dst);
            src_acc = lock(&src);
        }

        let receipt = TransferReceipt {
            debit_id: self.next_trans_id(),
            credit_id: self.next_trans_id(),
        };
        transfer_between(
            &mut src_acc,
            &mut dst_acc,
            (receipt.debit_id, receipt.credit_id),
            amount,
            Utc::now(),
        )
        .map_err(|e| {
            debug!(
                "event=transfer module=ledger status=rejected from={} to={} amount={} reason={}",
                from, to, *amount, e
            );
            e
        })?;

        info!(
            "event=transfer module=ledger status=ok from={} to={} amount={} debit={} credit={}",
            from, to, *amount, receipt.debit_id, receipt.credit_id
        );
        Ok(receipt)
    }

    /// Block the `owner`'s account. Blocking a blocked account is a no-op.
    pub fn deactivate(&self, owner: UserID, account_id: AccountID) -> Result<(), LedgerErr> {
        let shared = self.get_owned(owner, account_id)?;
        lock(&shared).block();

        info!("event=account_block module=ledger status=ok account={account_id}");
        Ok(())
    }

    /// Accounts of `owner` ordered by identifier
    pub fn accounts_of(&self, owner: UserID) -> Vec<AccountSnapshot> {
        self.handles()
            .iter()
            .map(|shared| AccountSnapshot::from(&*lock(shared)))
            .filter(|acc| acc.owner() == owner)
            .collect()
    }

    /// Every account ordered by identifier
    pub fn snapshot(&self) -> Vec<AccountSnapshot> {
        self.handles()
            .iter()
            .map(|shared| AccountSnapshot::from(&*lock(shared)))
            .collect()
    }

    /// Transactions of the `owner`'s account, newest first
    pub fn history(
        &self,
        owner: UserID,
        account_id: AccountID,
    ) -> Result<Vec<TransRecord>, LedgerErr> {
        let shared = self.get_owned(owner, account_id)?;
        let account = lock(&shared);
        Ok(account.history().iter().rev().cloned().collect())
    }

    /// Sum of balances of all accounts
    pub fn total_balance(&self) -> Decimal {
        self.snapshot().iter().map(|acc| acc.balance()).sum()
    }

    fn next_trans_id(&self) -> TransID {
        self.next_trans_id.fetch_add(1, Ordering::Relaxed)
    }

    fn handles(&self) -> Vec<SharedAccount> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn get(&self, account_id: AccountID) -> Result<SharedAccount, LedgerErr> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .cloned()
            .ok_or(LedgerErr::UnknownAccount(account_id))
    }

    /// foreign accounts are reported as unknown
    fn get_owned(&self, owner: UserID, account_id: AccountID) -> Result<SharedAccount, LedgerErr> {
        let shared = self.get(account_id)?;
        if lock(&shared).owner() != owner {
            return Err(LedgerErr::UnknownAccount(account_id));
        }
        Ok(shared)
    }
}

#[cfg(test)]
mod test {
    use super::Ledger;
    use crate::account::{Account, AccountStatus, AccountType, TransKind};
    use crate::errors::{AccountErr, BalanceErr, LedgerErr};
    use crate::AccountID;
    use rust_decimal::Decimal;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const OWNER: u64 = 1;

    fn balance(l: &Ledger, id: AccountID) -> Decimal {
        l.snapshot()
            .into_iter()
            .find(|a| a.account_id() == id)
            .unwrap()
            .balance()
    }

    /// ledger with accounts X (balance 100) and Y (empty)
    fn two_accounts() -> (Ledger, AccountID, AccountID) {
        let l = Ledger::new();
        let x = l.open_account(OWNER, AccountType::Savings);
        let y = l.open_account(OWNER, AccountType::Current);
        l.deposit(OWNER, x, Decimal::new(100, 0)).unwrap();
        (l, x, y)
    }

    #[test]
    fn transfer_conserves_money() {
        let (l, x, y) = two_accounts();
        let before = balance(&l, x) + balance(&l, y);

        l.transfer(OWNER, x, y, Decimal::new(3725, 2)).unwrap();

        assert_eq!(balance(&l, x), Decimal::new(6275, 2));
        assert_eq!(balance(&l, y), Decimal::new(3725, 2));
        assert_eq!(balance(&l, x) + balance(&l, y), before);
        assert_eq!(l.total_balance(), before);
    }

    #[test]
    fn overdraw_fails_and_keeps_balances() {
        let (l, x, y) = two_accounts();

        let e = l.transfer(OWNER, x, y, Decimal::new(150, 0)).unwrap_err();

        assert_eq!(e, BalanceErr::NotEnoughAvailableFunds.into());
        assert_eq!(balance(&l, x), Decimal::new(100, 0));
        assert_eq!(balance(&l, y), Decimal::ZERO);
        assert_eq!(l.history(OWNER, y).unwrap().len(), 0);
    }

    #[test]
    fn deposit_then_transfer_everything() {
        let (l, x, y) = two_accounts();

        l.deposit(OWNER, x, Decimal::new(50, 0)).unwrap();
        assert_eq!(balance(&l, x), Decimal::new(150, 0));

        l.transfer(OWNER, x, y, Decimal::new(150, 0)).unwrap();
        assert_eq!(balance(&l, x), Decimal::ZERO);
        assert_eq!(balance(&l, y), Decimal::new(150, 0));

        // two deposits and the debit on X
        let x_hist = l.history(OWNER, x).unwrap();
        assert_eq!(x_hist.len(), 3);
        assert_eq!(x_hist[0].kind(), TransKind::Debit);

        let y_hist = l.history(OWNER, y).unwrap();
        assert_eq!(y_hist.len(), 1);
        assert_eq!(y_hist[0].kind(), TransKind::Credit);
        assert_eq!(y_hist[0].counterparty(), Some(x));
        assert_eq!(x_hist[0].counterparty(), Some(y));
        assert_eq!(x_hist[0].created_at(), y_hist[0].created_at());
    }

    #[test]
    fn deposit_then_transfer_of_same_amount_restores_origin() {
        let (l, x, y) = two_accounts();
        let origin = balance(&l, x);

        l.deposit(OWNER, x, Decimal::new(1999, 2)).unwrap();
        l.transfer(OWNER, x, y, Decimal::new(1999, 2)).unwrap();

        assert_eq!(balance(&l, x), origin);
    }

    #[test]
    fn invalid_arguments() {
        let (l, x, y) = two_accounts();

        assert_eq!(
            l.transfer(OWNER, x, 99, Decimal::ONE),
            Err(LedgerErr::UnknownAccount(99))
        );
        assert_eq!(
            l.transfer(OWNER, 98, y, Decimal::ONE),
            Err(LedgerErr::UnknownAccount(98))
        );
        assert_eq!(
            l.transfer(OWNER, x, x, Decimal::ONE),
            Err(LedgerErr::SameAccount)
        );
        assert!(matches!(
            l.transfer(OWNER, x, y, Decimal::ZERO),
            Err(LedgerErr::Account(AccountErr::Amount(_)))
        ));
        assert!(matches!(
            l.deposit(OWNER, x, Decimal::new(-5, 0)),
            Err(LedgerErr::Account(AccountErr::Amount(_)))
        ));
        assert!(matches!(
            l.deposit(OWNER, x, Decimal::new(1, 3)),
            Err(LedgerErr::Account(AccountErr::Amount(_)))
        ));
        assert_eq!(balance(&l, x), Decimal::new(100, 0));
    }

    #[test]
    fn foreign_accounts_are_invisible() {
        let (l, x, y) = two_accounts();
        let stranger = 2;
        let z = l.open_account(stranger, AccountType::Savings);

        assert_eq!(
            l.transfer(stranger, x, z, Decimal::ONE),
            Err(LedgerErr::UnknownAccount(x))
        );
        assert_eq!(
            l.deposit(stranger, y, Decimal::ONE),
            Err(LedgerErr::UnknownAccount(y))
        );
        assert_eq!(l.history(stranger, x), Err(LedgerErr::UnknownAccount(x)));
        assert_eq!(l.deactivate(stranger, x), Err(LedgerErr::UnknownAccount(x)));

        // destination may belong to someone else
        l.transfer(OWNER, x, z, Decimal::ONE).unwrap();
        assert_eq!(l.accounts_of(stranger).len(), 1);
        assert_eq!(l.accounts_of(OWNER).len(), 2);
    }

    #[test]
    fn blocked_account_stops_money() {
        let (l, x, y) = two_accounts();
        l.deactivate(OWNER, y).unwrap();
        l.deactivate(OWNER, y).unwrap();

        assert_eq!(
            l.transfer(OWNER, x, y, Decimal::ONE),
            Err(AccountErr::Blocked.into())
        );
        assert_eq!(
            l.deposit(OWNER, y, Decimal::ONE),
            Err(AccountErr::Blocked.into())
        );
        assert_eq!(balance(&l, x), Decimal::new(100, 0));

        let accounts = l.accounts_of(OWNER);
        assert_eq!(accounts[1].status(), AccountStatus::Blocked);
    }

    #[test]
    fn concurrent_transfers_never_double_spend() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 50;

        let l = Arc::new(Ledger::new());
        let src = l.open_account(OWNER, AccountType::Savings);
        let targets: Vec<_> = (0..THREADS)
            .map(|_| l.open_account(OWNER, AccountType::Current))
            .collect();
        l.deposit(OWNER, src, Decimal::new(1000, 0)).unwrap();
        let initial_total = l.total_balance();

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = targets
            .iter()
            .map(|&dst| {
                let l = Arc::clone(&l);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..ROUNDS {
                        let _ = l.transfer(OWNER, src, dst, Decimal::new(7, 0));
                        // opposite direction takes the locks in the other order
                        let _ = l.transfer(OWNER, dst, src, Decimal::new(1, 0));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(l.total_balance(), initial_total);
        assert!(balance(&l, src) >= Decimal::ZERO);
        for acc in l.snapshot() {
            assert!(acc.balance() >= Decimal::ZERO);
        }
    }

    #[test]
    fn concurrent_debits_bounded_by_balance() {
        const THREADS: usize = 16;

        let l = Arc::new(Ledger::new());
        let src = l.open_account(OWNER, AccountType::Savings);
        let dst = l.open_account(OWNER, AccountType::Savings);
        l.deposit(OWNER, src, Decimal::new(100, 0)).unwrap();

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let l = Arc::clone(&l);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    l.transfer(OWNER, src, dst, Decimal::new(30, 0)).is_ok()
                })
            })
            .collect();

        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 3);
        assert_eq!(balance(&l, src), Decimal::new(10, 0));
        assert_eq!(balance(&l, dst), Decimal::new(90, 0));
    }
}
