use crate::field::Field;
use alloy_primitives::B256;
use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};
use std::sync::OnceLock;
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Widest Poseidon instance the circom parameter set ships (t = 13).
pub const MAX_FIELD_HASH_ARITY: usize = 12;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("poseidon arity {0} unsupported (expected 1..=12)")]
    Arity(usize),
    #[error("poseidon: {0}")]
    Poseidon(String),
    #[error("{primitive} self-test failed: expected {expected}, got {actual}")]
    SelfTest {
        primitive: &'static str,
        expected: String,
        actual: String,
    },
}

// =============================================================================
//                          KECCAK256 HELPERS
// =============================================================================

/// Compute keccak256 hash. This matches Solidity's keccak256() opcode.
/// Note: tiny_keccak::Keccak is the original Keccak-256 (NOT SHA3-256).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// keccak256(abi.encodePacked(parts...)) for already-encoded parts.
pub fn keccak256_packed(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

// =============================================================================
//                          POSEIDON (BN254)
// =============================================================================

/// Circuit-compatible Poseidon over the BN254 scalar field.
///
/// Uses the circom parameter set, which is what Noir's `poseidon::bn254` and
/// the `PoseidonT3` Solidity library implement. A width-`n+1` instance is
/// built per call; the sponge is not reused across inputs.
pub fn field_hash(elements: &[Field]) -> Result<Field, HashError> {
    if elements.is_empty() || elements.len() > MAX_FIELD_HASH_ARITY {
        return Err(HashError::Arity(elements.len()));
    }
    let inputs: Vec<Fr> = elements.iter().map(Field::inner).collect();
    let mut poseidon =
        Poseidon::<Fr>::new_circom(inputs.len()).map_err(|e| HashError::Poseidon(e.to_string()))?;
    let digest = poseidon
        .hash(&inputs)
        .map_err(|e| HashError::Poseidon(e.to_string()))?;
    Ok(Field::from_inner(digest))
}

// =============================================================================
//                          ROOT COMBINER
// =============================================================================

/// Single-leaf root advancement:
///   nextRoot = keccak256(bytes32((uint256(root) ^ uint256(commitment)) % 2**253))
///
/// Stand-in for incremental Merkle maintenance; only the one-leaf tree the
/// withdraw circuit is compiled for is modelled.
pub fn advance_root(current_root: &B256, commitment: &B256) -> B256 {
    let mut mixed = [0u8; 32];
    for (i, byte) in mixed.iter_mut().enumerate() {
        *byte = current_root[i] ^ commitment[i];
    }
    // mod 2^253: clear the top three bits of the big-endian word
    mixed[0] &= 0x1f;
    B256::from(keccak256(&mixed))
}

// =============================================================================
//                          STARTUP SELF-TEST
// =============================================================================

const KECCAK_EMPTY: &str = "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";
const KECCAK_ZERO_WORD: &str = "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563";
// circomlibjs poseidon([1, 2])
const POSEIDON_1_2: &str = "0x115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a";

static SELF_TEST: OnceLock<Result<(), HashError>> = OnceLock::new();

/// Check both primitives against fixed vectors. Runs once per process; the
/// cached outcome is returned on later calls.
///
/// A failure means commitments computed here would not match the circuit, so
/// callers treat it as a configuration error and refuse to start.
pub fn self_test() -> Result<(), HashError> {
    SELF_TEST.get_or_init(run_self_test).clone()
}

fn run_self_test() -> Result<(), HashError> {
    check("keccak256", KECCAK_EMPTY, hex::encode(keccak256(&[])))?;
    check("keccak256", KECCAK_ZERO_WORD, hex::encode(keccak256(&[0u8; 32])))?;
    let digest = field_hash(&[Field::from(1), Field::from(2)])?;
    check("poseidon", POSEIDON_1_2, digest.to_string())
}

fn check(primitive: &'static str, expected: &str, actual: String) -> Result<(), HashError> {
    if actual != expected {
        return Err(HashError::SelfTest {
            primitive,
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
