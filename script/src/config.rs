//! Environment configuration for the CLI and the e2e binary.
//!
//! Variables (optionally loaded from `.env`):
//!   POOL_STATE              - state file path (default: fixtures/pool.json)
//!   POOL_ADMIN              - address allowed to register roots (required by `init`)
//!   GENESIS_ROOT            - initial root (default: 0x…01)
//!   ADVANCE_ROOT_ON_DEPOSIT - `true` to advance the root on every deposit (default: false)
//!   POOL_SALT               - ciphertext salt override (default: keccak256("ShieldedPool.v2b"))
//!   RPC_URL                 - JSON-RPC endpoint of the on-chain verifier
//!   VERIFIER_ADDRESS        - deployed verifier contract

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use shielded_pool::{default_genesis_root, PoolConfig, RootPolicy};
use shielded_pool_lib::pool_salt;
use std::path::PathBuf;

pub const DEFAULT_STATE_PATH: &str = "fixtures/pool.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    pub state_path: PathBuf,
    pub admin: Option<Address>,
    pub genesis_root: B256,
    pub root_policy: RootPolicy,
    pub salt: B256,
    pub rpc_url: Option<String>,
    pub verifier_address: Option<Address>,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let state_path = var("POOL_STATE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
        let admin = var("POOL_ADMIN")
            .map(|v| v.trim().parse::<Address>())
            .transpose()
            .context("POOL_ADMIN must be an address")?;
        let genesis_root = var("GENESIS_ROOT")
            .map(|v| v.trim().parse::<B256>())
            .transpose()
            .context("GENESIS_ROOT must be a 32-byte hex word")?
            .unwrap_or_else(default_genesis_root);
        let advance = var("ADVANCE_ROOT_ON_DEPOSIT")
            .map(|v| v.trim().parse::<bool>())
            .transpose()
            .context("ADVANCE_ROOT_ON_DEPOSIT must be true or false")?
            .unwrap_or(false);
        let salt = var("POOL_SALT")
            .map(|v| v.trim().parse::<B256>())
            .transpose()
            .context("POOL_SALT must be a 32-byte hex word")?
            .unwrap_or_else(pool_salt);
        let verifier_address = var("VERIFIER_ADDRESS")
            .map(|v| v.trim().parse::<Address>())
            .transpose()
            .context("VERIFIER_ADDRESS must be an address")?;

        Ok(CliConfig {
            state_path,
            admin,
            genesis_root,
            root_policy: if advance {
                RootPolicy::AdvanceOnDeposit
            } else {
                RootPolicy::Manual
            },
            salt,
            rpc_url: var("RPC_URL"),
            verifier_address,
        })
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            genesis_root: self.genesis_root,
            root_policy: self.root_policy,
        }
    }

    pub fn require_admin(&self) -> Result<Address> {
        self.admin.context("POOL_ADMIN not set")
    }

    pub fn require_onchain(&self) -> Result<(String, Address)> {
        let url = self.rpc_url.clone().context("RPC_URL not set")?;
        let address = self.verifier_address.context("VERIFIER_ADDRESS not set")?;
        Ok((url, address))
    }
}
