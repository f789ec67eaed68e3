//! Spent nullifier set: the double-spend guard.
//!
//! A nullifier hash moves from absent to present exactly once. Presence is
//! permanent; the only removal path is the rollback of a withdrawal whose
//! token transfer failed inside the same critical section.

use crate::error::PoolError;
use alloy_primitives::B256;
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct NullifierLedger {
    spent: HashSet<B256>,
    order: Vec<B256>,
}

impl NullifierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spent(&self, nullifier_hash: &B256) -> bool {
        self.spent.contains(nullifier_hash)
    }

    pub fn mark_spent(&mut self, nullifier_hash: B256) -> Result<(), PoolError> {
        if !self.spent.insert(nullifier_hash) {
            return Err(PoolError::AlreadySpent(nullifier_hash));
        }
        self.order.push(nullifier_hash);
        Ok(())
    }

    pub(crate) fn rollback(&mut self, nullifier_hash: &B256) {
        if self.order.last() == Some(nullifier_hash) {
            self.order.pop();
            self.spent.remove(nullifier_hash);
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
