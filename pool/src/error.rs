use crate::snapshot::SnapshotError;
use crate::token::TokenError;
use alloy_primitives::{Address, B256};
use shielded_pool_lib::HashError;
use thiserror::Error;

/// Every way a pool operation can fail. None of these are retried
/// internally; each one reflects bad input or a ledger conflict.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("deposit amount must be non-zero")]
    ZeroAmount,
    #[error("commitment {0} already recorded")]
    DuplicateCommitment(B256),
    #[error("malformed public inputs: {0}")]
    MalformedPublicInputs(String),
    #[error("withdrawal value must be non-zero")]
    ZeroValue,
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    #[error("unknown root {0}")]
    UnknownRoot(B256),
    #[error("nullifier {0} already spent")]
    AlreadySpent(B256),
    #[error("malformed recipient field {0}")]
    MalformedRecipient(B256),
    #[error("{0} is not authorized to register roots")]
    Unauthorized(Address),
    #[error("the zero root cannot be registered")]
    ZeroRoot,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("hash configuration: {0}")]
    Configuration(#[from] HashError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
