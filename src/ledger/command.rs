//! Relayer CLI backed ledger client
//!
//! Shells out to the relayer binary for every call. The relayer owns keys,
//! light client headers and RPC timeouts; this adapter only maps its exit
//! status and JSON output onto [`LedgerClient`].

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use super::client::{ChannelState, LedgerClient, LedgerError, UnrelayedSequences};
use crate::config::RelayerConfig;
use crate::path::{Path, PathEnd};

/// Ledger client that drives the relayer command line
pub struct CommandLedgerClient {
    binary: PathBuf,
    home: Option<PathBuf>,
    chains: HashSet<String>,
}

impl CommandLedgerClient {
    /// Create a client for the configured relayer and known chains
    pub fn new<'a>(config: &RelayerConfig, chains: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            binary: config.binary.clone(),
            home: config.home.clone(),
            chains: chains.into_iter().map(str::to_string).collect(),
        }
    }

    fn resolve_chain(&self, chain_id: &str) -> Result<(), LedgerError> {
        if self.chains.contains(chain_id) {
            Ok(())
        } else {
            Err(LedgerError::ChainNotFound(chain_id.to_string()))
        }
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.binary.display(), args.join(" "))
    }

    /// Run the relayer and return its stdout on success
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, LedgerError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).kill_on_drop(true);
        if let Some(home) = &self.home {
            cmd.arg("--home").arg(home);
        }

        let command = self.describe(args);
        debug!(%command, "Running relayer command");

        let output = cmd.output().await.map_err(|source| LedgerError::Spawn {
            command: command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(LedgerError::Command {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl LedgerClient for CommandLedgerClient {
    async fn submit_keep_alive(
        &self,
        src_chain: &str,
        dst_chain: &str,
        client_id: &str,
    ) -> Result<(), LedgerError> {
        self.resolve_chain(src_chain)?;
        self.resolve_chain(dst_chain)?;

        self.run(&["tx", "raw", "update-client", src_chain, dst_chain, client_id])
            .await
            .map(|_| ())
            .map_err(|e| LedgerError::Submission {
                src_chain: src_chain.to_string(),
                dst_chain: dst_chain.to_string(),
                client_id: client_id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn channel_state(&self, end: &PathEnd) -> Result<ChannelState, LedgerError> {
        self.resolve_chain(&end.chain_id)?;

        let args = [
            "query",
            "channel",
            end.chain_id.as_str(),
            end.client_id.as_str(),
            end.connection_id.as_str(),
            end.channel_id.as_str(),
            end.port_id.as_str(),
        ];
        let stdout = self.run(&args).await?;
        parse_channel_state(&self.describe(&args), &stdout)
    }

    async fn unrelayed_sequences(&self, path: &Path) -> Result<UnrelayedSequences, LedgerError> {
        self.resolve_chain(&path.src.chain_id)?;
        self.resolve_chain(&path.dst.chain_id)?;

        let args = ["query", "unrelayed", path.name.as_str()];
        let stdout = self.run(&args).await?;
        serde_json::from_slice(&stdout).map_err(|source| LedgerError::Decode {
            command: self.describe(&args),
            source,
        })
    }
}

/// Extract the channel state from `query channel` output
///
/// Accepts the state at `channel.channel.state`, `channel.state` or `state`,
/// as either a name or the numeric protobuf enum value.
fn parse_channel_state(command: &str, stdout: &[u8]) -> Result<ChannelState, LedgerError> {
    let value: Value = serde_json::from_slice(stdout).map_err(|source| LedgerError::Decode {
        command: command.to_string(),
        source,
    })?;

    let state = [
        value.pointer("/channel/channel/state"),
        value.pointer("/channel/state"),
        value.get("state"),
    ]
    .into_iter()
    .flatten()
    .next();

    match state {
        Some(Value::String(name)) => Ok(ChannelState::parse(name)),
        Some(Value::Number(n)) => Ok(match n.as_u64() {
            Some(0) => ChannelState::Uninitialized,
            Some(1) => ChannelState::Init,
            Some(2) => ChannelState::TryOpen,
            Some(3) => ChannelState::Open,
            Some(4) => ChannelState::Closed,
            _ => ChannelState::Unknown(n.to_string()),
        }),
        _ => Err(LedgerError::Query(format!(
            "channel state missing from output of `{}`",
            command
        ))),
    }
}
