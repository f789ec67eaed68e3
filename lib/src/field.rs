//! BN254 scalar field element, as seen by the withdraw circuit.
//!
//! Every private note input (secret, nullifier seed, value) is one of these.
//! On the wire a field element is a 32-byte big-endian word, the same layout
//! Noir and Solidity use for `Field` / `uint256` public inputs.

use alloy_primitives::{B256, U256};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use core::fmt;
use core::str::FromStr;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised when decoding a field element.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("field element is longer than 32 bytes")]
    TooLong,
    #[error("value is not a canonical BN254 scalar (>= modulus)")]
    NonCanonical,
}

/// An element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field(Fr);

impl Field {
    pub fn zero() -> Self {
        Field(Fr::from(0u64))
    }

    /// Largest representable element, `p - 1`.
    pub fn max_value() -> Self {
        Field(-Fr::from(1u64))
    }

    /// Decode a big-endian word, rejecting anything `>= p`.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self, FieldError> {
        let reduced = Fr::from_be_bytes_mod_order(bytes);
        let field = Field(reduced);
        if field.to_be_bytes() != *bytes {
            return Err(FieldError::NonCanonical);
        }
        Ok(field)
    }

    /// Reduce arbitrary bytes modulo `p`.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Field(Fr::from_be_bytes_mod_order(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        // BigInt<4> always serialises to 32 bytes
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Uniformly random element: 32 random bytes reduced mod `p`.
    /// The reduction bias is below 2^-250 and is accepted.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self::from_be_bytes_mod_order(&bytes)
    }

    pub fn from_u256(value: U256) -> Result<Self, FieldError> {
        Self::from_be_bytes(&value.to_be_bytes::<32>())
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_be_bytes(self.to_be_bytes())
    }

    pub fn from_b256(word: B256) -> Result<Self, FieldError> {
        Self::from_be_bytes(&word.0)
    }

    pub fn to_b256(&self) -> B256 {
        B256::from(self.to_be_bytes())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub(crate) fn inner(&self) -> Fr {
        self.0
    }

    pub(crate) fn from_inner(inner: Fr) -> Self {
        Field(inner)
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field(Fr::from(value))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_bytes()))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({self})")
    }
}

/// Parses `0x`-prefixed or bare hex of up to 64 digits. Short inputs are
/// left-padded, so `"0x1"` is the element one.
impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(FieldError::InvalidHex(s.to_string()));
        }
        if digits.len() > 64 {
            return Err(FieldError::TooLong);
        }
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| FieldError::InvalidHex(e.to_string()))?;
        Self::from_be_bytes(&bytes)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
