//! Command line and environment configuration

use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf};

/// Address the original backend listened on
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Banking backend: serve the REST API or replay a csv batch of ledger operations
#[derive(Debug, Parser)]
#[command(name = "bank-ledger", version, about, long_about = None)]
pub struct Cli {
    /// Log level or flexi_logger spec, e.g. `info` or `warn,bank_ledger::ledger=debug`
    #[arg(long, global = true, env = "BANK_LEDGER_LOG", default_value = "info")]
    pub log_level: String,

    /// subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the REST API
    Serve {
        /// Socket address to listen on
        #[arg(long, env = "BANK_LEDGER_ADDR", default_value = DEFAULT_ADDR)]
        addr: SocketAddr,
    },

    /// Apply operations from a csv file and print account balances as csv
    Replay {
        /// csv with columns `type`, `account`, `to`, `amount`, `account_type`
        file: PathBuf,
    },
}
