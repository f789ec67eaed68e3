//! The pool: one mutex-guarded ledger behind deposit, root registration and
//! withdrawal.
//!
//! Every mutation runs inside `state.lock()`, so deposits and withdrawals are
//! linearizable. Proof verification happens before the lock is taken; the
//! root and nullifier checks run under it, so two withdrawals racing on one
//! nullifier see exactly one success.

use crate::admin::AdminAuthority;
use crate::error::PoolError;
use crate::events::{EventSink, PoolEvent};
use crate::ledger::{RootPolicy, RootRegistry};
use crate::snapshot::{LedgerSnapshot, LedgerState};
use crate::token::TokenTransfer;
use crate::verifier::Verifier;
use crate::withdraw::{Progress, Rejected, WithdrawalReceipt, WithdrawalRequest, WithdrawalStage};
use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shielded_pool_lib::WithdrawPublicInputs;
use tracing::{debug, info, warn};

/// Genesis root used by the reference deployment: `bytes32(uint256(1))`.
pub fn default_genesis_root() -> B256 {
    B256::with_last_byte(1)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub genesis_root: B256,
    #[serde(default)]
    pub root_policy: RootPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            genesis_root: default_genesis_root(),
            root_policy: RootPolicy::Manual,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub depositor: Address,
    pub commitment: B256,
    pub amount: U256,
    /// Position of the commitment in deposit order.
    pub leaf_index: usize,
    /// `currentRoot` once the deposit committed.
    pub root: B256,
}

pub struct ShieldedPool<V, T, E, A> {
    config: PoolConfig,
    verifier: V,
    token: T,
    events: E,
    admin: A,
    state: Mutex<LedgerState>,
}

impl<V, T, E, A> ShieldedPool<V, T, E, A>
where
    V: Verifier,
    T: TokenTransfer,
    E: EventSink,
    A: AdminAuthority,
{
    /// Fresh pool whose only root is `config.genesis_root`.
    ///
    /// Runs the hash self-test first; a mismatch with the circuit's hash is
    /// a configuration error and no pool is built.
    pub fn new(config: PoolConfig, verifier: V, token: T, events: E, admin: A) -> Result<Self, PoolError> {
        shielded_pool_lib::self_test()?;
        let roots = RootRegistry::new(config.genesis_root)?;
        info!(genesis_root = %config.genesis_root, policy = ?config.root_policy, "shielded pool ready");
        Ok(ShieldedPool {
            config,
            verifier,
            token,
            events,
            admin,
            state: Mutex::new(LedgerState::new(roots)),
        })
    }

    /// Pool resumed from a persisted ledger.
    pub fn restore(
        config: PoolConfig,
        snapshot: &LedgerSnapshot,
        verifier: V,
        token: T,
        events: E,
        admin: A,
    ) -> Result<Self, PoolError> {
        shielded_pool_lib::self_test()?;
        let state = LedgerState::from_snapshot(snapshot)?;
        info!(
            commitments = state.commitments.len(),
            roots = state.roots.len(),
            nullifiers = state.nullifiers.len(),
            current_root = %state.roots.current(),
            "shielded pool restored"
        );
        Ok(ShieldedPool {
            config,
            verifier,
            token,
            events,
            admin,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    // =========================================================================
    //                          QUERIES
    // =========================================================================

    pub fn is_known_root(&self, root: &B256) -> bool {
        self.state.lock().roots.is_known(root)
    }

    pub fn current_root(&self) -> B256 {
        self.state.lock().roots.current()
    }

    pub fn is_spent(&self, nullifier_hash: &B256) -> bool {
        self.state.lock().nullifiers.is_spent(nullifier_hash)
    }

    pub fn is_commitment_recorded(&self, commitment: &B256) -> bool {
        self.state.lock().commitments.contains(commitment)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().to_snapshot()
    }

    // =========================================================================
    //                          DEPOSIT
    // =========================================================================

    /// Record `commitment` and pull `amount` from `depositor`.
    ///
    /// A failed token pull leaves no trace in the ledger.
    pub fn deposit(&self, depositor: Address, commitment: B256, amount: U256) -> Result<DepositReceipt, PoolError> {
        if amount.is_zero() {
            warn!(%depositor, %commitment, "deposit rejected: zero amount");
            return Err(PoolError::ZeroAmount);
        }

        let mut state = self.state.lock();
        let next_root = match self.config.root_policy {
            RootPolicy::AdvanceOnDeposit => Some(state.roots.next_root(&commitment)?),
            RootPolicy::Manual => None,
        };
        if let Err(err) = state.commitments.insert(commitment) {
            warn!(%depositor, %commitment, "deposit rejected: duplicate commitment");
            return Err(err);
        }
        if let Err(err) = self.token.transfer_in(depositor, amount) {
            state.commitments.rollback(&commitment);
            warn!(%depositor, %commitment, %amount, %err, "deposit rejected: token transfer failed");
            return Err(err.into());
        }
        if let Some(root) = next_root {
            state.roots.commit(root);
            debug!(%root, "root advanced by deposit");
        }

        let receipt = DepositReceipt {
            depositor,
            commitment,
            amount,
            leaf_index: state.commitments.len() - 1,
            root: state.roots.current(),
        };
        self.events.emit(&PoolEvent::Deposit {
            depositor,
            commitment,
            amount,
        });
        info!(%depositor, %commitment, %amount, leaf_index = receipt.leaf_index, "deposit recorded");
        Ok(receipt)
    }

    // =========================================================================
    //                          ROOTS
    // =========================================================================

    /// Admin-only. Returns `false` when `root` was already known.
    pub fn register_root(&self, caller: Address, root: B256) -> Result<bool, PoolError> {
        if !self.admin.is_admin(caller) {
            warn!(%caller, %root, "register_root rejected: unauthorized");
            return Err(PoolError::Unauthorized(caller));
        }
        let added = self.state.lock().roots.register(root)?;
        if added {
            info!(%caller, %root, "root registered");
        } else {
            debug!(%root, "root already known");
        }
        Ok(added)
    }

    // =========================================================================
    //                          WITHDRAW
    // =========================================================================

    /// Authorize and pay out a withdrawal.
    ///
    /// Funds go to the recipient baked into the public inputs; `caller` is
    /// only recorded in the event, so any holder of a valid proof may relay it.
    pub fn withdraw(&self, caller: Address, request: &WithdrawalRequest) -> Result<WithdrawalReceipt, Rejected> {
        let mut progress = Progress::start(caller);

        let inputs = WithdrawPublicInputs::decode(&request.public_inputs)
            .map_err(|e| progress.reject(PoolError::MalformedPublicInputs(e.to_string())))?;
        if inputs.value.is_zero() {
            return Err(progress.reject(PoolError::ZeroValue));
        }

        // No lock held: the oracle may be slow.
        match self.verifier.verify(&request.proof, &request.public_inputs) {
            Ok(true) => {}
            Ok(false) => {
                return Err(progress.reject(PoolError::InvalidProof("verifier returned false".to_string())))
            }
            Err(err) => return Err(progress.reject(PoolError::InvalidProof(err.to_string()))),
        }
        progress.advance(WithdrawalStage::ProofVerified);

        let mut state = self.state.lock();
        if !state.roots.is_known(&inputs.root) {
            return Err(progress.reject(PoolError::UnknownRoot(inputs.root)));
        }
        progress.advance(WithdrawalStage::RootChecked);

        if state.nullifiers.is_spent(&inputs.nullifier_hash) {
            return Err(progress.reject(PoolError::AlreadySpent(inputs.nullifier_hash)));
        }
        progress.advance(WithdrawalStage::NullifierChecked);

        if let Some(ciphertext) = &request.ciphertext {
            debug!(%ciphertext, "v2b ciphertext attached");
        }

        let recipient = inputs
            .recipient()
            .map_err(|_| progress.reject(PoolError::MalformedRecipient(inputs.recipient_field)))?;
        state
            .nullifiers
            .mark_spent(inputs.nullifier_hash)
            .map_err(|e| progress.reject(e))?;
        if let Err(err) = self.token.transfer_out(recipient, inputs.value) {
            state.nullifiers.rollback(&inputs.nullifier_hash);
            return Err(progress.reject(err.into()));
        }
        progress.advance(WithdrawalStage::FundsReleased);
        progress.advance(WithdrawalStage::NullifierRecorded);

        self.events.emit(&PoolEvent::Withdrawal {
            caller,
            recipient,
            value: inputs.value,
        });
        drop(state);

        info!(%caller, %recipient, value = %inputs.value, nullifier_hash = %inputs.nullifier_hash, "withdrawal paid");
        Ok(WithdrawalReceipt {
            caller,
            recipient,
            value: inputs.value,
            nullifier_hash: inputs.nullifier_hash,
            root: inputs.root,
            ciphertext: request.ciphertext,
        })
    }
}
