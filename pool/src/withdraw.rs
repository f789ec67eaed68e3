//! Withdrawal authorization states.
//!
//!   Received → ProofVerified → RootChecked → NullifierChecked
//!            → FundsReleased → NullifierRecorded
//!
//! Any non-terminal state may end in [`Rejected`], which records the last
//! state reached and the reason.

use crate::error::PoolError;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawalStage {
    Received,
    ProofVerified,
    RootChecked,
    NullifierChecked,
    FundsReleased,
    NullifierRecorded,
}

impl WithdrawalStage {
    pub fn next(self) -> Option<Self> {
        use WithdrawalStage::*;
        match self {
            Received => Some(ProofVerified),
            ProofVerified => Some(RootChecked),
            RootChecked => Some(NullifierChecked),
            NullifierChecked => Some(FundsReleased),
            FundsReleased => Some(NullifierRecorded),
            NullifierRecorded => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for WithdrawalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A withdrawal as submitted by whoever holds the proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
    pub public_inputs: Vec<B256>,
    /// v2b amount ciphertext. Carried for off-ledger consumers only; the
    /// state machine does not check it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<B256>,
}

impl WithdrawalRequest {
    pub fn new(proof: Vec<u8>, public_inputs: Vec<B256>) -> Self {
        WithdrawalRequest {
            proof,
            public_inputs,
            ciphertext: None,
        }
    }

    pub fn with_ciphertext(mut self, ciphertext: B256) -> Self {
        self.ciphertext = Some(ciphertext);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub caller: Address,
    pub recipient: Address,
    pub value: U256,
    pub nullifier_hash: B256,
    pub root: B256,
    pub ciphertext: Option<B256>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("withdrawal rejected at {stage}: {reason}")]
pub struct Rejected {
    /// Last state reached before rejection.
    pub stage: WithdrawalStage,
    pub reason: PoolError,
}

/// Tracks one withdrawal through its states.
#[derive(Debug)]
pub(crate) struct Progress {
    caller: Address,
    stage: WithdrawalStage,
}

impl Progress {
    pub(crate) fn start(caller: Address) -> Self {
        debug!(%caller, stage = %WithdrawalStage::Received, "withdrawal received");
        Progress {
            caller,
            stage: WithdrawalStage::Received,
        }
    }

    pub(crate) fn advance(&mut self, to: WithdrawalStage) {
        debug_assert_eq!(self.stage.next(), Some(to), "skipped a withdrawal state");
        debug!(caller = %self.caller, from = %self.stage, %to, "withdrawal transition");
        self.stage = to;
    }

    pub(crate) fn reject(&self, reason: PoolError) -> Rejected {
        warn!(caller = %self.caller, stage = %self.stage, %reason, "withdrawal rejected");
        Rejected {
            stage: self.stage,
            reason,
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
