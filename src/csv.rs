//! csv replay input/output format and functions

use csv_async::{AsyncWriterBuilder, Terminator};
use log::warn;
use rust_decimal::Decimal;

use crate::{
    account::{self, Account, AccountType},
    amount::to_minor_scale,
    errors::LedgerErr,
    ledger::Ledger,
    AccountID, UserID,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc::{Receiver, Sender},
};
use tokio_stream::{Stream, StreamExt};

/// Owner of every account opened by a replay
pub const REPLAY_OWNER: UserID = 0;

// Allowed operation types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum RawOperationType {
    Open,
    Deposit,
    Transfer,
    Deactivate,
}

/// One row of replay input. `account` and `to` are labels chosen by the file author, mapped to
/// ledger identifiers when the label is opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct RawOperation {
    pub r#type: RawOperationType,
    pub account: u64,
    pub to: Option<u64>,
    pub amount: Option<Decimal>,
    pub account_type: Option<String>,
}

/// take a reader and continuously deserialize operations from it into `sender`
pub async fn deserialize_operations_from_csv_reader<'r, R: AsyncRead + Unpin + Send + 'r>(
    input: R,
    sender: Sender<RawOperation>,
) -> anyhow::Result<()> {
    let mut builder = csv_async::AsyncReaderBuilder::new();
    builder.trim(csv_async::Trim::All);

    let mut rdr = builder.create_deserializer(input);

    let _headers = rdr.headers().await?;

    let mut records = rdr.deserialize::<RawOperation>();
    while let Some(record) = records.next().await {
        let record: RawOperation = record?;
        sender.send(record).await?;
    }

    Ok(())
}

/// Reasons a replayed row is skipped
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplayErr {
    #[error("label {0} was not opened")]
    UnknownLabel(u64),
    #[error("label {0} is already opened")]
    DuplicateLabel(u64),
    #[error("missing `{0}` column")]
    MissingField(&'static str),
    #[error("invalid account type")]
    AccountType,
    #[error(transparent)]
    Ledger(#[from] LedgerErr),
}

/// Applies [`RawOperation`]s in order to a ledger owned by [`REPLAY_OWNER`]
#[derive(Debug, Default)]
pub struct Replay {
    ledger: Ledger,
    labels: BTreeMap<u64, AccountID>,
    applied: usize,
    skipped: usize,
}

impl Replay {
    /// Replay over an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// replayed ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// number of rows applied and skipped so far
    pub fn counts(&self) -> (usize, usize) {
        (self.applied, self.skipped)
    }

    /// apply one row, failed rows leave the ledger untouched
    pub fn apply(&mut self, op: RawOperation) -> Result<(), ReplayErr> {
        let result = self.try_apply(&op);
        match &result {
            Ok(()) => self.applied += 1,
            Err(e) => {
                self.skipped += 1;
                warn!(
                    "event=replay_row module=csv status=skipped type={:?} account={} reason={}",
                    op.r#type, op.account, e
                );
            }
        }
        result
    }

    fn try_apply(&mut self, op: &RawOperation) -> Result<(), ReplayErr> {
        match op.r#type {
            RawOperationType::Open => {
                if self.labels.contains_key(&op.account) {
                    return Err(ReplayErr::DuplicateLabel(op.account));
                }
                let account_type = match op.account_type.as_deref() {
                    None => AccountType::Savings,
                    Some(name) => name.parse().map_err(|_| ReplayErr::AccountType)?,
                };
                let id = self.ledger.open_account(REPLAY_OWNER, account_type);
                self.labels.insert(op.account, id);
            }
            RawOperationType::Deposit => {
                let id = self.resolve(op.account)?;
                let amount = op.amount.ok_or(ReplayErr::MissingField("amount"))?;
                self.ledger.deposit(REPLAY_OWNER, id, amount)?;
            }
            RawOperationType::Transfer => {
                let from = self.resolve(op.account)?;
                let to = self.resolve(op.to.ok_or(ReplayErr::MissingField("to"))?)?;
                let amount = op.amount.ok_or(ReplayErr::MissingField("amount"))?;
                self.ledger.transfer(REPLAY_OWNER, from, to, amount)?;
            }
            RawOperationType::Deactivate => {
                let id = self.resolve(op.account)?;
                self.ledger.deactivate(REPLAY_OWNER, id)?;
            }
        }
        Ok(())
    }

    fn resolve(&self, label: u64) -> Result<AccountID, ReplayErr> {
        self.labels
            .get(&label)
            .copied()
            .ok_or(ReplayErr::UnknownLabel(label))
    }
}

/// receive operations from `input` and apply them in order of arrival
pub async fn apply_operations(mut input: Receiver<RawOperation>) -> anyhow::Result<Replay> {
    let mut replay = Replay::new();
    while let Some(op) = input.recv().await {
        // skipped rows are logged by `apply`
        let _ = replay.apply(op);
    }
    Ok(replay)
}

/// summary account balance and state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct AccountSummary {
    pub account: AccountID,
    account_type: AccountType,
    balance: Decimal,
    status: account::AccountStatus,
    transactions: usize,
}

impl<T: Account> From<T> for AccountSummary {
    fn from(oth: T) -> Self {
        Self {
            account: oth.account_id(),
            account_type: oth.account_type(),
            balance: to_minor_scale(oth.balance()),
            status: oth.status(),
            transactions: oth.transactions_count(),
        }
    }
}

/// read items from `in_stream` and save them as [`AccountSummary`] into `wr`. Headers will be
/// included automatically. Terminator is `\r\n`.
pub async fn summarize_accounts(
    in_stream: impl Stream<Item = impl account::Account> + Unpin,
    wr: impl AsyncWrite + Unpin,
) -> anyhow::Result<()> {
    let mut in_stream = in_stream;

    let mut builder = AsyncWriterBuilder::new();
    builder.terminator(Terminator::CRLF);

    let mut wr = builder.create_serializer(wr);

    while let Some(acc) = in_stream.next().await {
        let acc_summary = AccountSummary::from(acc);
        wr.serialize(acc_summary).await?;
    }

    wr.flush().await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{
        apply_operations, deserialize_operations_from_csv_reader, summarize_accounts,
        RawOperation, RawOperationType, Replay, ReplayErr,
    };
    use crate::errors::{BalanceErr, LedgerErr};
    use rust_decimal::Decimal;
    use tokio::sync::mpsc::channel;
    use tokio_stream::{wrappers::ReceiverStream, StreamExt};

    fn op(r#type: RawOperationType, account: u64, to: Option<u64>, amount: Option<i64>) -> RawOperation {
        RawOperation {
            r#type,
            account,
            to,
            amount: amount.map(|a| Decimal::new(a, 0)),
            account_type: None,
        }
    }

    #[tokio::test]
    async fn ser_output_format() -> anyhow::Result<()> {
        let mut replay = Replay::new();
        replay.apply(op(RawOperationType::Open, 7, None, None))?;
        replay.apply(op(RawOperationType::Deposit, 7, None, Some(750)))?;

        let in_stream = tokio_stream::iter(replay.ledger().snapshot());
        let output = Vec::with_capacity(8192);

        let mut wr = tokio::io::BufWriter::new(output);

        summarize_accounts(in_stream, &mut wr).await?;

        let expected = "account,account_type,balance,status,transactions\r\n1,Savings,750.00,ACTIVE,1\r\n";

        let output_str = String::from_utf8(wr.into_inner()).unwrap();

        assert_eq!(output_str, expected);

        Ok(())
    }

    #[tokio::test]
    async fn des_input_format() -> anyhow::Result<()> {
        let raw_in = r#"type, account, to, amount, account_type
open, 1, , , current
open, 2, , ,
deposit, 1, , 100,
transfer, 1, 2, 1.5,"#;

        let (tx, rx) = channel(2);
        tokio::spawn(async move {
            deserialize_operations_from_csv_reader(Vec::from(raw_in).as_ref(), tx).await
        });

        let ops: Vec<RawOperation> = ReceiverStream::new(rx).collect().await;
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].account_type.as_deref(), Some("current"));
        assert_eq!(ops[1].account_type, None);
        assert_eq!(
            ops[3],
            RawOperation {
                r#type: RawOperationType::Transfer,
                account: 1,
                to: Some(2),
                amount: Some(Decimal::new(15, 1)),
                account_type: None,
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn failed_rows_are_skipped() -> anyhow::Result<()> {
        let (tx, rx) = channel(8);
        let task = tokio::spawn(apply_operations(rx));

        tx.send(op(RawOperationType::Open, 1, None, None)).await?;
        tx.send(op(RawOperationType::Open, 2, None, None)).await?;
        tx.send(op(RawOperationType::Deposit, 1, None, Some(100))).await?;
        tx.send(op(RawOperationType::Transfer, 1, Some(2), Some(150))).await?;
        tx.send(op(RawOperationType::Transfer, 1, Some(3), Some(10))).await?;
        drop(tx);

        let replay = task.await??;
        assert_eq!(replay.counts(), (3, 2));
        assert_eq!(replay.ledger().total_balance(), Decimal::new(100, 0));

        Ok(())
    }

    #[test]
    fn replay_errors() {
        let mut replay = Replay::new();
        replay.apply(op(RawOperationType::Open, 1, None, None)).unwrap();
        replay.apply(op(RawOperationType::Open, 2, None, None)).unwrap();

        assert_eq!(
            replay.apply(op(RawOperationType::Open, 1, None, None)),
            Err(ReplayErr::DuplicateLabel(1))
        );
        assert_eq!(
            replay.apply(op(RawOperationType::Deposit, 1, None, None)),
            Err(ReplayErr::MissingField("amount"))
        );
        assert_eq!(
            replay.apply(op(RawOperationType::Transfer, 1, Some(2), Some(5))),
            Err(ReplayErr::Ledger(LedgerErr::from(
                BalanceErr::NotEnoughAvailableFunds
            )))
        );
        assert_eq!(
            replay.apply(op(RawOperationType::Deactivate, 9, None, None)),
            Err(ReplayErr::UnknownLabel(9))
        );
    }
}
