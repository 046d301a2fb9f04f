//! Ledger access
//!
//! The probes talk to chains only through the [`LedgerClient`] trait.

mod client;
mod command;

pub use client::{ChannelState, LedgerClient, LedgerError, UnrelayedSequences};
pub use command::CommandLedgerClient;
