//! # bank-ledger
//! Banking backend. `serve` exposes the REST API, `replay` reads ledger operations from a csv
//! file and prints resulting account balances to output.
//!
//! ## Replay input format
//! csv with columns `type`, `account`, `to`, `amount`, `account_type`
//!
//! ```csv
//! type,account,to,amount,account_type
//! open,1,,,savings
//! open,2,,,current
//! deposit,1,,100.00,
//! transfer,1,2,40.50,
//! ```

#![deny(missing_docs)]

use anyhow::Context;
use bank_ledger::{
    auth::Auth,
    config::{Cli, Command},
    csv::{self, RawOperation},
    logging,
    server::{self, AppState},
};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio::{
    io::{stdout, BufReader},
    spawn,
    sync::mpsc::{channel, Sender},
};

async fn read_ops_from_file(filename: PathBuf, sender: Sender<RawOperation>) -> anyhow::Result<()> {
    let f = tokio::fs::File::open(&filename)
        .await
        .with_context(|| format!("access input file {}", filename.display()))?;

    let bf = BufReader::new(f);
    csv::deserialize_operations_from_csv_reader(bf, sender)
        .await
        .context("improper content of file")?;

    Ok(())
}

async fn replay(filename: PathBuf) -> anyhow::Result<()> {
    // read data from csv file
    let (tx_raw_ops, rx_raw_ops) = channel(8192);
    let task_read_csv = spawn(read_ops_from_file(filename, tx_raw_ops));

    // transfers span accounts, so operations are applied by a single task in file order
    let task_apply = spawn(csv::apply_operations(rx_raw_ops));

    // await each task to complete and handle its errors if occurred
    task_read_csv.await??;
    let replay = task_apply.await??;

    let (applied, skipped) = replay.counts();
    info!("event=replay module=csv status=ok applied={applied} skipped={skipped}");

    let accounts = tokio_stream::iter(replay.ledger().snapshot());
    csv::summarize_accounts(accounts, stdout())
        .await
        .context("failed to save output")?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logger = logging::init_logging(&cli.log_level)?;

    match cli.command {
        Command::Serve { addr } => {
            let state = AppState::new(Auth::new());
            server::run_server(addr, state)
                .await
                .with_context(|| format!("serving on {addr}"))
        }
        Command::Replay { file } => replay(file).await,
    }
}
