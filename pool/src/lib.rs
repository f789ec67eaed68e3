//! Shielded pool ledger: commitments, roots, nullifiers and the withdrawal
//! state machine, wired to pluggable verifier, token, event and admin
//! capabilities.

pub mod admin;
pub mod error;
pub mod events;
pub mod ledger;
pub mod nullifier;
pub mod pool;
pub mod snapshot;
pub mod token;
pub mod verifier;
pub mod withdraw;

pub use admin::{AdminAuthority, AdminSet};
pub use error::PoolError;
pub use events::{EventSink, MemoryEventLog, PoolEvent, TracingEventSink};
pub use ledger::{CommitmentLedger, RootPolicy, RootRegistry};
pub use nullifier::NullifierLedger;
pub use pool::{default_genesis_root, DepositReceipt, PoolConfig, ShieldedPool};
pub use snapshot::{LedgerSnapshot, RootRow, SnapshotError};
pub use token::{MemoryToken, TokenError, TokenSnapshot, TokenTransfer};
pub use verifier::{DigestVerifier, Verifier, VerifierError};
pub use withdraw::{Rejected, WithdrawalReceipt, WithdrawalRequest, WithdrawalStage};
