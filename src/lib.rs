//! Banking backend: account ledger with atomic transfers, REST API and typed client

#![deny(missing_docs)]

pub mod account;
pub mod amount;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod csv;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod server;

/// Account identifier. Unique across all users, assigned sequentially from 1
pub type AccountID = u64;
/// Transaction identifier. Unique across all [`AccountID`]
pub type TransID = u64;
/// User identifier
pub type UserID = u64;
