//! End-to-end run: deposit → register root → relayed withdraw → ciphertext
//! recovery, against an in-memory pool.
//!
//! Usage:
//!   cargo run --release -p shielded-pool-script --bin e2e
//!
//! Optional env vars (from .env):
//!   DEPOSIT_AMOUNT    - note value, raw token units (default: 1000000)
//!   POOL_SALT         - ciphertext salt override
//!   E2E_STATE         - where to save the final state (default: fixtures/e2e-pool.json)

use alloy_primitives::{Address, U256};
use anyhow::{ensure, Context, Result};
use shielded_pool::{
    default_genesis_root, DigestVerifier, MemoryEventLog, MemoryToken, PoolConfig, PoolError,
    PoolEvent, ShieldedPool, WithdrawalRequest,
};
use shielded_pool_lib::{
    advance_root, generate_note, recipient_field, AmountCipher, Field, WithdrawPublicInputs,
};
use shielded_pool_script::{setup_logger, CliConfig, StateFile};
use std::path::PathBuf;
use std::sync::Arc;

const POOL: Address = Address::repeat_byte(0x50);
const ADMIN: Address = Address::repeat_byte(0xAD);
const DEPOSITOR: Address = Address::repeat_byte(0xA1);
const RECIPIENT: Address = Address::repeat_byte(0xB0);
const RELAYER: Address = Address::repeat_byte(0xC0);

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger();
    let config = CliConfig::from_env()?;

    // ── Step 0: Load config ────────────────────────────────────────────
    println!("\n=== Shielded Pool E2E ===\n");

    let amount: U256 = std::env::var("DEPOSIT_AMOUNT")
        .unwrap_or_else(|_| "1000000".to_string())
        .parse()
        .context("DEPOSIT_AMOUNT must be an integer")?;
    let state_path = std::env::var("E2E_STATE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("fixtures/e2e-pool.json"));

    println!("Deposit amount:   {amount}");
    println!("Depositor:        {DEPOSITOR}");
    println!("Recipient:        {RECIPIENT}");
    println!("Relayer:          {RELAYER}\n");

    // ── Step 1: Self-test and pool setup ───────────────────────────────
    shielded_pool_lib::self_test()?;
    println!("[1] Hash self-test: OK");

    let token = Arc::new(MemoryToken::new(POOL));
    let events = Arc::new(MemoryEventLog::new());
    let pool_config = PoolConfig::default();
    let pool = ShieldedPool::new(pool_config.clone(), DigestVerifier, token.clone(), events.clone(), ADMIN)?;
    println!("    Genesis root: {}", pool.current_root());

    // ── Step 2: Generate a note ────────────────────────────────────────
    let secret = Field::random(&mut rand::thread_rng());
    let generated = generate_note(amount, secret, None)?;
    println!("[2] Note:           {}", generated.note);
    println!("    Commitment:     {}", generated.commitment);
    println!("    Nullifier hash: {}", generated.nullifier_hash);

    // ── Step 3: Approve and deposit ────────────────────────────────────
    token.mint(DEPOSITOR, amount);
    token.approve(DEPOSITOR, POOL, amount);
    let receipt = pool.deposit(DEPOSITOR, generated.commitment, amount)?;
    println!("[3] Deposited at leaf {}", receipt.leaf_index);
    ensure!(token.balance_of(POOL) == amount, "pool balance mismatch after deposit");

    // ── Step 4: Register the single-leaf root ──────────────────────────
    let root = advance_root(&default_genesis_root(), &generated.commitment);
    pool.register_root(ADMIN, root)?;
    ensure!(pool.current_root() == root, "registered root is not current");
    println!("[4] Registered root {root}");

    // ── Step 5: Build and relay the withdrawal ─────────────────────────
    let nullifier_hash = generated.nullifier_hash;
    let inputs = WithdrawPublicInputs::new(nullifier_hash, amount, root, RECIPIENT).encode();
    let cipher = AmountCipher::new(config.salt);
    let ciphertext = cipher.encrypt(amount, &nullifier_hash, &recipient_field(RECIPIENT));
    let request =
        WithdrawalRequest::new(DigestVerifier::prove(&inputs), inputs).with_ciphertext(ciphertext);
    println!("[5] Relaying withdrawal from {RELAYER}...");
    let withdrawal = pool.withdraw(RELAYER, &request)?;
    println!("    Paid {} to {}", withdrawal.value, withdrawal.recipient);

    // ── Step 6: Recipient recovers the amount ──────────────────────────
    let recovered = cipher.decrypt(&ciphertext, &nullifier_hash, &recipient_field(RECIPIENT));
    ensure!(recovered == amount, "ciphertext decrypted to {recovered}, expected {amount}");
    println!("[6] Ciphertext {ciphertext} decrypts to {recovered}");

    // ── Step 7: Replay is rejected ─────────────────────────────────────
    let replay = pool.withdraw(RELAYER, &request);
    ensure!(
        matches!(&replay, Err(r) if r.reason == PoolError::AlreadySpent(nullifier_hash)),
        "replay was not rejected: {replay:?}"
    );
    println!("[7] Replay rejected: AlreadySpent");

    // ── Step 8: Verify final state ─────────────────────────────────────
    println!("\n[8] Verifying final state...");
    ensure!(pool.is_spent(&nullifier_hash), "nullifier not spent");
    println!("    Nullifier spent: OK");
    ensure!(token.balance_of(RECIPIENT) == amount, "recipient not paid");
    ensure!(token.balance_of(RELAYER).is_zero(), "relayer was paid");
    ensure!(token.balance_of(POOL).is_zero(), "pool not drained");
    println!("    Balances: OK");
    let expected_events = vec![
        PoolEvent::Deposit {
            depositor: DEPOSITOR,
            commitment: generated.commitment,
            amount,
        },
        PoolEvent::Withdrawal {
            caller: RELAYER,
            recipient: RECIPIENT,
            value: amount,
        },
    ];
    ensure!(events.events() == expected_events, "unexpected event log");
    println!("    Events: OK");

    let state = StateFile {
        config: pool_config,
        admin: ADMIN,
        salt: config.salt,
        ledger: pool.snapshot(),
        token: token.snapshot(),
    };
    state.save(&state_path)?;
    println!("    State saved to {}", state_path.display());

    println!("\n=== E2E Passed! ===\n");
    Ok(())
}
