//! Persisted ledger layout:
//!
//!   commitments(commitment PK)
//!   roots(root PK, is_current bool)
//!   nullifiers(nullifierHash PK)
//!   currentRoot
//!
//! Rows keep insertion order so a restored ledger snapshots identically.

use crate::ledger::{CommitmentLedger, RootRegistry};
use crate::nullifier::NullifierLedger;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot has no roots")]
    NoRoots,
    #[error("snapshot contains the zero root")]
    ZeroRoot,
    #[error("current root {0} is not in the root table")]
    CurrentRootUnknown(B256),
    #[error("expected exactly one root flagged current, found {0}")]
    CurrentFlag(usize),
    #[error("duplicate {table} row {key}")]
    Duplicate { table: &'static str, key: B256 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRow {
    pub root: B256,
    pub is_current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub commitments: Vec<B256>,
    pub roots: Vec<RootRow>,
    pub nullifiers: Vec<B256>,
    pub current_root: B256,
}

/// Everything the pool's critical section owns.
#[derive(Clone, Debug)]
pub(crate) struct LedgerState {
    pub(crate) commitments: CommitmentLedger,
    pub(crate) roots: RootRegistry,
    pub(crate) nullifiers: NullifierLedger,
}

impl LedgerState {
    pub(crate) fn new(roots: RootRegistry) -> Self {
        LedgerState {
            commitments: CommitmentLedger::new(),
            roots,
            nullifiers: NullifierLedger::new(),
        }
    }

    pub(crate) fn to_snapshot(&self) -> LedgerSnapshot {
        let current_root = self.roots.current();
        LedgerSnapshot {
            commitments: self.commitments.iter().copied().collect(),
            roots: self
                .roots
                .iter()
                .map(|root| RootRow {
                    root: *root,
                    is_current: *root == current_root,
                })
                .collect(),
            nullifiers: self.nullifiers.iter().copied().collect(),
            current_root,
        }
    }

    pub(crate) fn from_snapshot(snapshot: &LedgerSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.roots.is_empty() {
            return Err(SnapshotError::NoRoots);
        }
        let mut seen = HashSet::new();
        for row in &snapshot.roots {
            if row.root == B256::ZERO {
                return Err(SnapshotError::ZeroRoot);
            }
            if !seen.insert(row.root) {
                return Err(SnapshotError::Duplicate {
                    table: "roots",
                    key: row.root,
                });
            }
        }
        if !seen.contains(&snapshot.current_root) {
            return Err(SnapshotError::CurrentRootUnknown(snapshot.current_root));
        }
        let flagged: Vec<&RootRow> = snapshot.roots.iter().filter(|r| r.is_current).collect();
        if flagged.len() != 1 || flagged[0].root != snapshot.current_root {
            return Err(SnapshotError::CurrentFlag(flagged.len()));
        }

        let mut commitments = CommitmentLedger::new();
        for commitment in &snapshot.commitments {
            commitments
                .insert(*commitment)
                .map_err(|_| SnapshotError::Duplicate {
                    table: "commitments",
                    key: *commitment,
                })?;
        }
        let mut nullifiers = NullifierLedger::new();
        for nullifier in &snapshot.nullifiers {
            nullifiers
                .mark_spent(*nullifier)
                .map_err(|_| SnapshotError::Duplicate {
                    table: "nullifiers",
                    key: *nullifier,
                })?;
        }
        let roots = RootRegistry::from_parts(
            snapshot.roots.iter().map(|r| r.root).collect(),
            snapshot.current_root,
        );
        Ok(LedgerState {
            commitments,
            roots,
            nullifiers,
        })
    }
}
