//! Ledger client interface
//!
//! Everything the probes need from a chain goes through [`LedgerClient`].

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::path::{Path, PathEnd};

/// Ledger client errors
///
/// Each variant names the step that failed so probe logs carry context.
/// `PathBinding` and `HeaderSync` come from clients that drive those steps
/// themselves; [`CommandLedgerClient`](super::CommandLedgerClient) leaves them
/// to the relayer and reports any relayer failure as `Command`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain '{0}' not found")]
    ChainNotFound(String),
    #[error("failed to bind path to chain '{chain_id}': {reason}")]
    PathBinding { chain_id: String, reason: String },
    #[error("failed to sync headers: {0}")]
    HeaderSync(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("update of client '{client_id}' on {src_chain} (tracking {dst_chain}) failed: {reason}")]
    Submission {
        src_chain: String,
        dst_chain: String,
        client_id: String,
        reason: String,
    },
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("failed to decode output of `{command}`: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LedgerError {
    /// Short name of the step that failed
    pub fn stage(&self) -> &'static str {
        match self {
            LedgerError::ChainNotFound(_) => "chain_lookup",
            LedgerError::PathBinding { .. } => "path_binding",
            LedgerError::HeaderSync(_) => "header_sync",
            LedgerError::Query(_) => "query",
            LedgerError::Submission { .. } => "submission",
            LedgerError::Spawn { .. } | LedgerError::Command { .. } => "command",
            LedgerError::Decode { .. } => "decode",
        }
    }
}

/// Lifecycle state of one channel end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Uninitialized,
    Init,
    TryOpen,
    Open,
    Closed,
    /// Anything the client reported that is not a known state
    Unknown(String),
}

impl ChannelState {
    /// Parse a state name, with or without the `STATE_` prefix
    pub fn parse(raw: &str) -> Self {
        let name = raw.trim();
        let name = name.strip_prefix("STATE_").unwrap_or(name);
        match name.to_ascii_uppercase().as_str() {
            "UNINITIALIZED" | "UNINITIALIZED_UNSPECIFIED" => ChannelState::Uninitialized,
            "INIT" => ChannelState::Init,
            "TRYOPEN" => ChannelState::TryOpen,
            "OPEN" => ChannelState::Open,
            "CLOSED" => ChannelState::Closed,
            _ => ChannelState::Unknown(raw.to_string()),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Uninitialized => f.write_str("UNINITIALIZED"),
            ChannelState::Init => f.write_str("INIT"),
            ChannelState::TryOpen => f.write_str("TRYOPEN"),
            ChannelState::Open => f.write_str("OPEN"),
            ChannelState::Closed => f.write_str("CLOSED"),
            ChannelState::Unknown(raw) => write!(f, "UNKNOWN({})", raw),
        }
    }
}

/// Sequences sent on one side but not yet relayed to the other
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnrelayedSequences {
    #[serde(default)]
    pub src: Vec<u64>,
    #[serde(default)]
    pub dst: Vec<u64>,
}

impl UnrelayedSequences {
    /// Backlog across both directions
    pub fn total(&self) -> u64 {
        (self.src.len() + self.dst.len()) as u64
    }
}

/// Chain access used by the keep-alive probes
///
/// Implementations own their own timeouts; the probes wait for as long as a
/// call takes.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a client update on `src_chain` for `client_id`, which tracks `dst_chain`
    async fn submit_keep_alive(
        &self,
        src_chain: &str,
        dst_chain: &str,
        client_id: &str,
    ) -> Result<(), LedgerError>;

    /// Current state of the channel at one end of a path
    async fn channel_state(&self, end: &PathEnd) -> Result<ChannelState, LedgerError>;

    /// Unrelayed packet sequences in both directions of a path
    async fn unrelayed_sequences(&self, path: &Path) -> Result<UnrelayedSequences, LedgerError>;
}
