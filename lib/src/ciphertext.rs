//! Amount disclosure for withdraw v2b.
//!
//!   key        = keccak256(nullifier ‖ recipientField ‖ POOL_SALT)
//!   stream     = keccak256(key ‖ uint256(0))
//!   ciphertext = amount XOR stream
//!
//! Anyone holding `(nullifier, recipientField)` recovers the amount with the
//! same keystream. There is no MAC: a tampered ciphertext decrypts to a wrong
//! but plausible amount without any error. Integrators must not rely on the
//! ciphertext for integrity.

use crate::hash::{keccak256, keccak256_packed};
use alloy_primitives::{B256, U256};

/// Domain string hashed into the default salt.
pub const POOL_SALT_DOMAIN: &[u8] = b"ShieldedPool.v2b";

/// keccak256("ShieldedPool.v2b")
pub fn pool_salt() -> B256 {
    B256::from(keccak256(POOL_SALT_DOMAIN))
}

/// Keystream cipher bound to one pool salt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountCipher {
    salt: B256,
}

impl Default for AmountCipher {
    fn default() -> Self {
        Self::new(pool_salt())
    }
}

impl AmountCipher {
    pub fn new(salt: B256) -> Self {
        AmountCipher { salt }
    }

    pub fn salt(&self) -> B256 {
        self.salt
    }

    pub fn key(&self, nullifier: &B256, recipient_field: &B256) -> B256 {
        B256::from(keccak256_packed(&[
            nullifier.as_slice(),
            recipient_field.as_slice(),
            self.salt.as_slice(),
        ]))
    }

    pub fn keystream(&self, nullifier: &B256, recipient_field: &B256) -> U256 {
        let key = self.key(nullifier, recipient_field);
        let stream = keccak256_packed(&[key.as_slice(), &[0u8; 32]]);
        U256::from_be_bytes(stream)
    }

    pub fn encrypt(&self, amount: U256, nullifier: &B256, recipient_field: &B256) -> B256 {
        let ciphertext = amount ^ self.keystream(nullifier, recipient_field);
        B256::from(ciphertext.to_be_bytes::<32>())
    }

    pub fn decrypt(&self, ciphertext: &B256, nullifier: &B256, recipient_field: &B256) -> U256 {
        U256::from_be_bytes(ciphertext.0) ^ self.keystream(nullifier, recipient_field)
    }
}

/// Ciphertext under the default pool salt.
pub fn compute_ciphertext(amount: U256, nullifier: &B256, recipient_field: &B256) -> B256 {
    AmountCipher::default().encrypt(amount, nullifier, recipient_field)
}

pub fn decrypt_ciphertext(ciphertext: &B256, nullifier: &B256, recipient_field: &B256) -> U256 {
    AmountCipher::default().decrypt(ciphertext, nullifier, recipient_field)
}
