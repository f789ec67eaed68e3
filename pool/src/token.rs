//! Token-transfer capability consumed by the pool, plus an in-memory
//! ERC-20-style book used by the CLI and tests.

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance for {account}: have {available}, need {needed}")]
    InsufficientBalance {
        account: Address,
        available: U256,
        needed: U256,
    },
    #[error("insufficient allowance from {owner}: have {available}, need {needed}")]
    InsufficientAllowance {
        owner: Address,
        available: U256,
        needed: U256,
    },
}

/// Moves tokens between users and the pool. A failed call must leave
/// balances untouched.
pub trait TokenTransfer: Send + Sync {
    /// Pull `amount` from `from` into the pool (`transferFrom`).
    fn transfer_in(&self, from: Address, amount: U256) -> Result<(), TokenError>;
    /// Pay `amount` out of the pool to `to` (`transfer`).
    fn transfer_out(&self, to: Address, amount: U256) -> Result<(), TokenError>;
}

impl<T: TokenTransfer + ?Sized> TokenTransfer for Arc<T> {
    fn transfer_in(&self, from: Address, amount: U256) -> Result<(), TokenError> {
        (**self).transfer_in(from, amount)
    }

    fn transfer_out(&self, to: Address, amount: U256) -> Result<(), TokenError> {
        (**self).transfer_out(to, amount)
    }
}

// =============================================================================
//                          IN-MEMORY TOKEN
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: Address,
    pub amount: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Serialisable state of a [`MemoryToken`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub pool: Address,
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl Book {
    fn balance(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn debit(&mut self, account: Address, amount: U256) -> Result<(), TokenError> {
        let available = self.balance(&account);
        let remaining = available
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                account,
                available,
                needed: amount,
            })?;
        self.balances.insert(account, remaining);
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: U256) {
        let entry = self.balances.entry(account).or_default();
        *entry = entry.saturating_add(amount);
    }
}

/// Mirrors the mock ERC-20 the pool is deployed against in tests: `mint`,
/// `approve`, and allowance-checked pulls on behalf of the pool account.
#[derive(Debug)]
pub struct MemoryToken {
    pool: Address,
    book: Mutex<Book>,
}

impl MemoryToken {
    pub fn new(pool: Address) -> Self {
        MemoryToken {
            pool,
            book: Mutex::new(Book::default()),
        }
    }

    pub fn pool_address(&self) -> Address {
        self.pool
    }

    pub fn mint(&self, to: Address, amount: U256) {
        self.book.lock().credit(to, amount);
    }

    pub fn approve(&self, owner: Address, spender: Address, amount: U256) {
        self.book.lock().allowances.insert((owner, spender), amount);
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.book.lock().balance(&account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.book
            .lock()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        let book = self.book.lock();
        let mut balances: Vec<BalanceEntry> = book
            .balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(account, amount)| BalanceEntry {
                account: *account,
                amount: *amount,
            })
            .collect();
        balances.sort_by_key(|entry| entry.account);
        let mut allowances: Vec<AllowanceEntry> = book
            .allowances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|((owner, spender), amount)| AllowanceEntry {
                owner: *owner,
                spender: *spender,
                amount: *amount,
            })
            .collect();
        allowances.sort_by_key(|entry| (entry.owner, entry.spender));
        TokenSnapshot {
            pool: self.pool,
            balances,
            allowances,
        }
    }

    pub fn from_snapshot(snapshot: TokenSnapshot) -> Self {
        let mut book = Book::default();
        for entry in snapshot.balances {
            book.credit(entry.account, entry.amount);
        }
        for entry in snapshot.allowances {
            book.allowances
                .insert((entry.owner, entry.spender), entry.amount);
        }
        MemoryToken {
            pool: snapshot.pool,
            book: Mutex::new(book),
        }
    }
}

impl TokenTransfer for MemoryToken {
    fn transfer_in(&self, from: Address, amount: U256) -> Result<(), TokenError> {
        let mut book = self.book.lock();
        let key = (from, self.pool);
        let allowed = book.allowances.get(&key).copied().unwrap_or_default();
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                available: allowed,
                needed: amount,
            });
        }
        book.debit(from, amount)?;
        book.allowances.insert(key, allowed - amount);
        book.credit(self.pool, amount);
        Ok(())
    }

    fn transfer_out(&self, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut book = self.book.lock();
        book.debit(self.pool, amount)?;
        book.credit(to, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: Address = Address::repeat_byte(0x50);
    const ALICE: Address = Address::repeat_byte(0xA1);

    #[test]
    fn test_transfer_in_requires_allowance() {
        let token = MemoryToken::new(POOL);
        token.mint(ALICE, U256::from(100u64));
        let err = token.transfer_in(ALICE, U256::from(10u64)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));

        token.approve(ALICE, POOL, U256::from(10u64));
        token.transfer_in(ALICE, U256::from(10u64)).unwrap();
        assert_eq!(token.balance_of(ALICE), U256::from(90u64));
        assert_eq!(token.balance_of(POOL), U256::from(10u64));
        assert_eq!(token.allowance(ALICE, POOL), U256::ZERO);
    }

    #[test]
    fn test_transfer_in_requires_balance_and_keeps_allowance() {
        let token = MemoryToken::new(POOL);
        token.mint(ALICE, U256::from(5u64));
        token.approve(ALICE, POOL, U256::from(10u64));
        let err = token.transfer_in(ALICE, U256::from(10u64)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        assert_eq!(token.allowance(ALICE, POOL), U256::from(10u64));
        assert_eq!(token.balance_of(ALICE), U256::from(5u64));
    }

    #[test]
    fn test_transfer_out_limited_by_pool_balance() {
        let token = MemoryToken::new(POOL);
        let err = token.transfer_out(ALICE, U256::from(1u64)).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                account: POOL,
                available: U256::ZERO,
                needed: U256::from(1u64),
            }
        );
        token.mint(POOL, U256::from(3u64));
        token.transfer_out(ALICE, U256::from(3u64)).unwrap();
        assert_eq!(token.balance_of(ALICE), U256::from(3u64));
    }

    #[test]
    fn test_snapshot_restore() {
        let token = MemoryToken::new(POOL);
        token.mint(ALICE, U256::from(7u64));
        token.approve(ALICE, POOL, U256::from(3u64));
        let snapshot = token.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = MemoryToken::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.balance_of(ALICE), U256::from(7u64));
        assert_eq!(restored.allowance(ALICE, POOL), U256::from(3u64));
        assert_eq!(restored.snapshot(), snapshot);
    }
}
