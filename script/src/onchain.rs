//! Proof verification against a deployed verifier contract.

use alloy::{
    primitives::{Address, Bytes, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    sol,
};
use anyhow::{Context, Result};
use shielded_pool::{Verifier, VerifierError};
use tokio::runtime::Runtime;

// ---------------------------------------------------------------------------
// Contract bindings (inline - no ABI files needed)
// ---------------------------------------------------------------------------

sol! {
    #[sol(rpc)]
    interface IVerifier {
        function verify(bytes calldata proof, bytes32[] calldata publicInputs) external view returns (bool);
    }
}

/// Calls `IVerifier.verify` over JSON-RPC. The pool API is synchronous, so
/// each call blocks on a private runtime; do not use from inside another
/// tokio runtime.
pub struct OnchainVerifier {
    runtime: Runtime,
    provider: DynProvider,
    address: Address,
}

impl OnchainVerifier {
    pub fn connect(rpc_url: &str, address: Address) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building tokio runtime")?;
        let url = rpc_url.parse().with_context(|| format!("invalid RPC_URL {rpc_url}"))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(OnchainVerifier {
            runtime,
            provider,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl Verifier for OnchainVerifier {
    fn verify(&self, proof: &[u8], public_inputs: &[B256]) -> Result<bool, VerifierError> {
        let contract = IVerifier::new(self.address, &self.provider);
        self.runtime
            .block_on(async {
                contract
                    .verify(Bytes::copy_from_slice(proof), public_inputs.to_vec())
                    .call()
                    .await
            })
            .map_err(|e| VerifierError(e.to_string()))
    }
}
