#[cfg(test)]
mod tests {
    use shielded_pool::*;
    use shielded_pool_lib::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const POOL: Address = Address::repeat_byte(0x50);
    const ADMIN: Address = Address::repeat_byte(0xAD);
    const PARTY_A: Address = Address::repeat_byte(0xA1);
    const PARTY_B: Address = Address::repeat_byte(0xB0);
    const PARTY_C: Address = Address::repeat_byte(0xC0);

    type Pool<V> = ShieldedPool<V, Arc<MemoryToken>, Arc<MemoryEventLog>, AdminSet>;

    /// Wraps the digest oracle and counts how often it is consulted.
    #[derive(Default)]
    struct CountingVerifier(AtomicUsize);

    impl Verifier for CountingVerifier {
        fn verify(&self, proof: &[u8], public_inputs: &[B256]) -> Result<bool, VerifierError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            DigestVerifier.verify(proof, public_inputs)
        }
    }

    fn build_pool<V: Verifier>(verifier: V, config: PoolConfig) -> (Pool<V>, Arc<MemoryToken>, Arc<MemoryEventLog>) {
        let token = Arc::new(MemoryToken::new(POOL));
        let events = Arc::new(MemoryEventLog::new());
        token.mint(PARTY_A, U256::from(1_000_000u64));
        token.approve(PARTY_A, POOL, U256::MAX);
        let admin: AdminSet = [ADMIN].into_iter().collect();
        let pool = ShieldedPool::new(config, verifier, token.clone(), events.clone(), admin).unwrap();
        (pool, token, events)
    }

    fn sample_note(value: u64, seed: u64) -> GeneratedNote {
        generate_note(U256::from(value), Field::from(0xABCD), Some(Field::from(seed))).unwrap()
    }

    /// Deposit `note` and register the single-leaf root over it.
    fn deposit_and_register<V: Verifier>(pool: &Pool<V>, note: &GeneratedNote) -> B256 {
        pool.deposit(PARTY_A, note.commitment, note.note.amount()).unwrap();
        let root = advance_root(&pool.current_root(), &note.commitment);
        assert!(pool.register_root(ADMIN, root).unwrap());
        root
    }

    fn withdrawal_for(note: &GeneratedNote, root: B256, recipient: Address) -> WithdrawalRequest {
        let inputs = WithdrawPublicInputs::new(note.nullifier_hash, note.note.amount(), root, recipient).encode();
        WithdrawalRequest::new(DigestVerifier::prove(&inputs), inputs)
    }

    #[test]
    fn test_recipient_binding_pays_encoded_address() {
        let (pool, token, events) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(500, 1);
        let root = deposit_and_register(&pool, &note);

        // A builds a proof naming B; C relays it.
        let request = withdrawal_for(&note, root, PARTY_B);
        let receipt = pool.withdraw(PARTY_C, &request).unwrap();

        assert_eq!(receipt.caller, PARTY_C);
        assert_eq!(receipt.recipient, PARTY_B);
        assert_eq!(token.balance_of(PARTY_B), U256::from(500u64));
        assert_eq!(token.balance_of(PARTY_C), U256::ZERO);
        assert_eq!(token.balance_of(PARTY_A), U256::from(1_000_000u64 - 500));
        assert_eq!(
            events.events().last(),
            Some(&PoolEvent::Withdrawal {
                caller: PARTY_C,
                recipient: PARTY_B,
                value: U256::from(500u64),
            })
        );
    }

    #[test]
    fn test_deposit_scenario_and_zero_value_short_circuit() {
        let verifier = Arc::new(CountingVerifier::default());
        let (pool, token, _) = build_pool(verifier.clone(), PoolConfig::default());
        let commitment = B256::repeat_byte(0x11);

        pool.deposit(PARTY_A, commitment, U256::from(100u64)).unwrap();
        for amount in [1u64, 100, 999] {
            assert_eq!(
                pool.deposit(PARTY_A, commitment, U256::from(amount)).unwrap_err(),
                PoolError::DuplicateCommitment(commitment)
            );
        }
        assert_eq!(token.balance_of(POOL), U256::from(100u64));

        let inputs =
            WithdrawPublicInputs::new(B256::repeat_byte(0x22), U256::ZERO, default_genesis_root(), PARTY_B).encode();
        let request = WithdrawalRequest::new(DigestVerifier::prove(&inputs), inputs);
        let rejected = pool.withdraw(PARTY_C, &request).unwrap_err();
        assert_eq!(rejected.reason, PoolError::ZeroValue);
        assert_eq!(verifier.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_root_gating_with_valid_proof() {
        let (pool, _, _) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(10, 2);
        pool.deposit(PARTY_A, note.commitment, note.note.amount()).unwrap();

        // Proof is valid for these inputs, but the root was never registered.
        let unregistered = advance_root(&default_genesis_root(), &note.commitment);
        let rejected = pool.withdraw(PARTY_C, &withdrawal_for(&note, unregistered, PARTY_B)).unwrap_err();
        assert_eq!(rejected.reason, PoolError::UnknownRoot(unregistered));
        assert_eq!(rejected.stage, WithdrawalStage::ProofVerified);
        assert!(!pool.is_spent(&note.nullifier_hash));
    }

    #[test]
    fn test_fresh_proof_over_spent_nullifier() {
        let (pool, token, _) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(300, 3);
        let root = deposit_and_register(&pool, &note);
        // a second deposit so the pool could cover a second payout
        pool.deposit(PARTY_A, B256::repeat_byte(0x99), U256::from(300u64)).unwrap();

        pool.withdraw(PARTY_C, &withdrawal_for(&note, root, PARTY_B)).unwrap();

        // Same nullifier, different recipient and root: still spent.
        let other_root = B256::repeat_byte(0x42);
        pool.register_root(ADMIN, other_root).unwrap();
        let rejected = pool.withdraw(PARTY_A, &withdrawal_for(&note, other_root, PARTY_A)).unwrap_err();
        assert_eq!(rejected.reason, PoolError::AlreadySpent(note.nullifier_hash));
        assert_eq!(token.balance_of(PARTY_B), U256::from(300u64));
        assert_eq!(token.balance_of(POOL), U256::from(300u64));
    }

    #[test]
    fn test_concurrent_withdrawals_one_success() {
        let (pool, token, _) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(1_000, 4);
        let root = deposit_and_register(&pool, &note);
        // enough liquidity for every racer, so only the nullifier can stop them
        pool.deposit(PARTY_A, B256::repeat_byte(0x77), U256::from(100_000u64)).unwrap();
        let request = withdrawal_for(&note, root, PARTY_B);

        let outcomes: Vec<Result<WithdrawalReceipt, Rejected>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| pool.withdraw(PARTY_C, &request))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(successes, 1);
        for outcome in outcomes.iter().filter_map(|o| o.as_ref().err()) {
            assert_eq!(outcome.reason, PoolError::AlreadySpent(note.nullifier_hash));
        }
        assert_eq!(token.balance_of(PARTY_B), U256::from(1_000u64));
    }

    #[test]
    fn test_single_leaf_root_policy_matches_manual_registration() {
        let config = PoolConfig {
            root_policy: RootPolicy::AdvanceOnDeposit,
            ..PoolConfig::default()
        };
        let (auto, _, _) = build_pool(DigestVerifier, config);
        let (manual, _, _) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(42, 5);

        auto.deposit(PARTY_A, note.commitment, note.note.amount()).unwrap();
        let registered = deposit_and_register(&manual, &note);
        assert_eq!(auto.current_root(), registered);

        // withdrawable straight away under the advancing policy
        auto.withdraw(PARTY_C, &withdrawal_for(&note, auto.current_root(), PARTY_B)).unwrap();
    }

    #[test]
    fn test_ciphertext_recovered_by_recipient() {
        let (pool, _, _) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(12_345, 6);
        let root = deposit_and_register(&pool, &note);
        let field = recipient_field(PARTY_B);
        let ciphertext = compute_ciphertext(note.note.amount(), &note.nullifier_hash, &field);

        let request = withdrawal_for(&note, root, PARTY_B).with_ciphertext(ciphertext);
        let receipt = pool.withdraw(PARTY_C, &request).unwrap();
        let carried = receipt.ciphertext.unwrap();
        assert_eq!(decrypt_ciphertext(&carried, &receipt.nullifier_hash, &field), U256::from(12_345u64));
        // someone else's key stream yields an unrelated amount
        let wrong = decrypt_ciphertext(&carried, &receipt.nullifier_hash, &recipient_field(PARTY_C));
        assert_ne!(wrong, U256::from(12_345u64));
    }

    #[test]
    fn test_unauthorized_root_registration() {
        let (pool, _, _) = build_pool(DigestVerifier, PoolConfig::default());
        let root = B256::repeat_byte(0x31);
        assert_eq!(pool.register_root(PARTY_C, root).unwrap_err(), PoolError::Unauthorized(PARTY_C));
        assert_eq!(pool.register_root(ADMIN, B256::ZERO).unwrap_err(), PoolError::ZeroRoot);
        assert!(!pool.is_known_root(&root));
    }

    #[test]
    fn test_snapshot_restore_keeps_spent_nullifiers() {
        let (pool, token, events) = build_pool(DigestVerifier, PoolConfig::default());
        let note = sample_note(77, 7);
        let root = deposit_and_register(&pool, &note);
        let request = withdrawal_for(&note, root, PARTY_B);
        pool.withdraw(PARTY_C, &request).unwrap();

        let json = serde_json::to_string(&pool.snapshot()).unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let admin: AdminSet = [ADMIN].into_iter().collect();
        let restored =
            ShieldedPool::restore(PoolConfig::default(), &snapshot, DigestVerifier, token, events, admin).unwrap();

        assert_eq!(restored.current_root(), root);
        assert!(restored.is_known_root(&default_genesis_root()));
        assert!(restored.is_commitment_recorded(&note.commitment));
        let rejected = restored.withdraw(PARTY_C, &request).unwrap_err();
        assert_eq!(rejected.reason, PoolError::AlreadySpent(note.nullifier_hash));
    }

    #[test]
    fn test_note_string_and_json_agree() {
        let note = sample_note(1_000_000, 8);
        let parsed = parse_note(&serialize_note(&note.note)).unwrap();
        assert_eq!(parsed.derive().unwrap(), note);

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["commitment"], serde_json::Value::String(note.commitment.to_string()));
        assert_eq!(
            json["note"]["value"],
            serde_json::Value::String(format!("0x{}", hex::encode(U256::from(1_000_000u64).to_be_bytes::<32>())))
        );
    }

    #[test]
    fn test_public_inputs_from_prover_output() {
        let note = sample_note(5, 9);
        let words = [
            note.nullifier_hash.to_string(),
            "0x5".to_string(),
            default_genesis_root().to_string(),
            recipient_field(PARTY_B).to_string(),
        ];
        let parsed = parse_public_inputs(&words).unwrap();
        let inputs = WithdrawPublicInputs::decode(&parsed).unwrap();
        assert_eq!(inputs.value, U256::from(5u64));
        assert_eq!(inputs.recipient().unwrap(), PARTY_B);
        assert_eq!(parsed, withdrawal_for(&note, default_genesis_root(), PARTY_B).public_inputs);
    }
}
