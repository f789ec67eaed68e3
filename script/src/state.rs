//! JSON state file backing the CLI: pool configuration, ledger snapshot and
//! the in-memory token book, saved after every mutating command.

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shielded_pool::{
    LedgerSnapshot, MemoryToken, PoolConfig, ShieldedPool, TokenSnapshot, TracingEventSink, Verifier,
};
use std::path::Path;
use std::sync::Arc;

/// Pool as the CLI runs it: token shared with the caller, events to tracing,
/// a single admin.
pub type CliPool<V> = ShieldedPool<V, Arc<MemoryToken>, TracingEventSink, Address>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub config: PoolConfig,
    pub admin: Address,
    /// Salt the ciphertext commands default to.
    pub salt: B256,
    pub ledger: LedgerSnapshot,
    pub token: TokenSnapshot,
}

impl StateFile {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading state file {} (run `init` first)", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing state file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing state file {}", path.display()))?;
        Ok(())
    }

    /// Rebuild the pool and its token from the file.
    pub fn open<V: Verifier>(&self, verifier: V) -> Result<(CliPool<V>, Arc<MemoryToken>)> {
        let token = Arc::new(MemoryToken::from_snapshot(self.token.clone()));
        let pool = ShieldedPool::restore(
            self.config.clone(),
            &self.ledger,
            verifier,
            token.clone(),
            TracingEventSink,
            self.admin,
        )?;
        Ok((pool, token))
    }

    /// Capture the pool's current ledger and token book.
    pub fn update<V: Verifier>(&mut self, pool: &CliPool<V>) {
        self.ledger = pool.snapshot();
        self.token = pool.token().snapshot();
    }
}
