//! Commitment set and root registry.

use crate::error::PoolError;
use alloy_primitives::B256;
use shielded_pool_lib::advance_root;
use std::collections::HashSet;

/// How `currentRoot` moves when a deposit lands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Roots only change through `register_root` (operator computes them off-ledger).
    #[default]
    Manual,
    /// Each deposit advances the root with the single-leaf combiner.
    AdvanceOnDeposit,
}

// =============================================================================
//                          COMMITMENTS
// =============================================================================

/// Every commitment ever deposited. Entries are never removed once a deposit
/// has committed.
#[derive(Clone, Debug, Default)]
pub struct CommitmentLedger {
    commitments: HashSet<B256>,
    // insertion order, for snapshots
    order: Vec<B256>,
}

impl CommitmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, commitment: &B256) -> bool {
        self.commitments.contains(commitment)
    }

    pub fn insert(&mut self, commitment: B256) -> Result<(), PoolError> {
        if !self.commitments.insert(commitment) {
            return Err(PoolError::DuplicateCommitment(commitment));
        }
        self.order.push(commitment);
        Ok(())
    }

    /// Undo the most recent insert when the token transfer of the same
    /// deposit fails.
    pub(crate) fn rollback(&mut self, commitment: &B256) {
        if self.order.last() == Some(commitment) {
            self.order.pop();
            self.commitments.remove(commitment);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &B256> {
        self.order.iter()
    }
}

// =============================================================================
//                          ROOTS
// =============================================================================

/// Append-only set of roots a withdrawal may prove against.
/// `current` is always a member.
#[derive(Clone, Debug)]
pub struct RootRegistry {
    known: HashSet<B256>,
    order: Vec<B256>,
    current: B256,
}

impl RootRegistry {
    pub fn new(genesis: B256) -> Result<Self, PoolError> {
        if genesis == B256::ZERO {
            return Err(PoolError::ZeroRoot);
        }
        Ok(RootRegistry {
            known: HashSet::from([genesis]),
            order: vec![genesis],
            current: genesis,
        })
    }

    pub fn current(&self) -> B256 {
        self.current
    }

    /// The zero root is never known.
    pub fn is_known(&self, root: &B256) -> bool {
        *root != B256::ZERO && self.known.contains(root)
    }

    /// Add `root` and make it current. Re-registering a known root changes
    /// nothing and returns `false`.
    pub fn register(&mut self, root: B256) -> Result<bool, PoolError> {
        if root == B256::ZERO {
            return Err(PoolError::ZeroRoot);
        }
        Ok(self.commit(root))
    }

    /// Root the single-leaf combiner yields for `commitment`, without
    /// registering it.
    pub fn next_root(&self, commitment: &B256) -> Result<B256, PoolError> {
        let next = advance_root(&self.current, commitment);
        if next == B256::ZERO {
            return Err(PoolError::ZeroRoot);
        }
        Ok(next)
    }

    /// Insert a root already checked to be non-zero.
    pub(crate) fn commit(&mut self, root: B256) -> bool {
        if !self.known.insert(root) {
            return false;
        }
        self.order.push(root);
        self.current = root;
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &B256> {
        self.order.iter()
    }

    pub(crate) fn from_parts(order: Vec<B256>, current: B256) -> Self {
        RootRegistry {
            known: order.iter().copied().collect(),
            order,
            current,
        }
    }
}
