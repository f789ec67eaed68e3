//! Proof verification oracle.
//!
//! The withdraw circuit is never evaluated here. Implementations wrap an
//! external verifier (on-chain contract, native backend) and must be
//! deterministic and free of side effects.

use alloy_primitives::B256;
use shielded_pool_lib::keccak256_packed;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("verifier backend failed: {0}")]
pub struct VerifierError(pub String);

pub trait Verifier: Send + Sync {
    fn verify(&self, proof: &[u8], public_inputs: &[B256]) -> Result<bool, VerifierError>;
}

impl<V: Verifier + ?Sized> Verifier for Arc<V> {
    fn verify(&self, proof: &[u8], public_inputs: &[B256]) -> Result<bool, VerifierError> {
        (**self).verify(proof, public_inputs)
    }
}

/// Development oracle: a "proof" is keccak256(abi.encodePacked(publicInputs)).
///
/// Binds a proof to its exact public inputs, which is all the ledger logic
/// needs to be exercised end to end. It proves nothing about note ownership.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestVerifier;

impl DigestVerifier {
    pub fn prove(public_inputs: &[B256]) -> Vec<u8> {
        let parts: Vec<&[u8]> = public_inputs.iter().map(|w| w.as_slice()).collect();
        keccak256_packed(&parts).to_vec()
    }
}

impl Verifier for DigestVerifier {
    fn verify(&self, proof: &[u8], public_inputs: &[B256]) -> Result<bool, VerifierError> {
        Ok(proof == Self::prove(public_inputs).as_slice())
    }
}
