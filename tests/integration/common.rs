//! Shared fixtures

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use relayer_keepalive::ledger::{ChannelState, LedgerClient, LedgerError, UnrelayedSequences};
use relayer_keepalive::path::{Path, PathEnd};

pub const CONFIG: &str = r#"
[metrics]
bind_addr = "127.0.0.1:0"

[probes]
channel_interval_secs = 10
unrelayed_interval_secs = 60

[[chains]]
chain_id = "gameofzoneshub-1"

[[chains]]
chain_id = "zone-1"

[paths.hub-zone]
src = { chain_id = "gameofzoneshub-1", client_id = "hubclient", connection_id = "hubconn", channel_id = "hubchan", port_id = "transfer" }
dst = { chain_id = "zone-1", client_id = "zoneclient", connection_id = "zoneconn", channel_id = "zonechan", port_id = "transfer" }
"#;

/// Ledger with fixed answers; submissions fail from a given call onwards
pub struct FakeLedger {
    pub src_state: Mutex<Result<ChannelState, String>>,
    pub dst_state: Mutex<Result<ChannelState, String>>,
    pub unrelayed: Mutex<Result<UnrelayedSequences, String>>,
    pub fail_submissions_from: Option<usize>,
    pub submissions: AtomicUsize,
    src_chain: String,
}

impl FakeLedger {
    pub fn healthy(path: &Path) -> Self {
        Self {
            src_state: Mutex::new(Ok(ChannelState::Open)),
            dst_state: Mutex::new(Ok(ChannelState::Open)),
            unrelayed: Mutex::new(Ok(UnrelayedSequences::default())),
            fail_submissions_from: None,
            submissions: AtomicUsize::new(0),
            src_chain: path.src.chain_id.clone(),
        }
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn submit_keep_alive(
        &self,
        src_chain: &str,
        dst_chain: &str,
        client_id: &str,
    ) -> Result<(), LedgerError> {
        let call = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        match self.fail_submissions_from {
            Some(from) if call >= from => Err(LedgerError::Submission {
                src_chain: src_chain.to_string(),
                dst_chain: dst_chain.to_string(),
                client_id: client_id.to_string(),
                reason: "node unreachable".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn channel_state(&self, end: &PathEnd) -> Result<ChannelState, LedgerError> {
        let state = if end.chain_id == self.src_chain {
            &self.src_state
        } else {
            &self.dst_state
        };
        state.lock().clone().map_err(LedgerError::Query)
    }

    async fn unrelayed_sequences(&self, _path: &Path) -> Result<UnrelayedSequences, LedgerError> {
        self.unrelayed.lock().clone().map_err(LedgerError::HeaderSync)
    }
}
