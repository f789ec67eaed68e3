//! Named view of the withdraw circuit's public inputs.
//!
//! The verifier consumes a flat `bytes32[]`; the order below is the order the
//! circuit declares them in and must not change:
//!
//!   [0] nullifierHash
//!   [1] value           (uint256, big-endian)
//!   [2] root
//!   [3] recipientField  (address left-padded to 32 bytes)
//!   [4..] circuit-specific extras, passed through untouched

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NULLIFIER_HASH_INDEX: usize = 0;
pub const VALUE_INDEX: usize = 1;
pub const ROOT_INDEX: usize = 2;
pub const RECIPIENT_INDEX: usize = 3;
pub const MIN_PUBLIC_INPUTS: usize = 4;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PublicInputError {
    #[error("expected at least 4 public inputs, got {0}")]
    TooFew(usize),
    #[error("recipient field {0} has non-zero upper 12 bytes")]
    MalformedRecipient(B256),
    #[error("invalid public input {index}: {reason}")]
    InvalidEncoding { index: usize, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPublicInputs {
    pub nullifier_hash: B256,
    pub value: U256,
    pub root: B256,
    pub recipient_field: B256,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<B256>,
}

impl WithdrawPublicInputs {
    pub fn new(nullifier_hash: B256, value: U256, root: B256, recipient: Address) -> Self {
        WithdrawPublicInputs {
            nullifier_hash,
            value,
            root,
            recipient_field: recipient_field(recipient),
            extra: Vec::new(),
        }
    }

    /// Decode positionally. Only the length is checked here; the recipient
    /// field is validated by [`Self::recipient`].
    pub fn decode(inputs: &[B256]) -> Result<Self, PublicInputError> {
        if inputs.len() < MIN_PUBLIC_INPUTS {
            return Err(PublicInputError::TooFew(inputs.len()));
        }
        Ok(WithdrawPublicInputs {
            nullifier_hash: inputs[NULLIFIER_HASH_INDEX],
            value: U256::from_be_bytes(inputs[VALUE_INDEX].0),
            root: inputs[ROOT_INDEX],
            recipient_field: inputs[RECIPIENT_INDEX],
            extra: inputs[MIN_PUBLIC_INPUTS..].to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<B256> {
        let mut out = Vec::with_capacity(MIN_PUBLIC_INPUTS + self.extra.len());
        out.push(self.nullifier_hash);
        out.push(B256::from(self.value.to_be_bytes::<32>()));
        out.push(self.root);
        out.push(self.recipient_field);
        out.extend_from_slice(&self.extra);
        out
    }

    /// The 20-byte address in the lower bytes of the recipient field.
    pub fn recipient(&self) -> Result<Address, PublicInputError> {
        recipient_from_field(&self.recipient_field)
    }
}

/// ABI encoding of `address`: 12 zero bytes + 20 address bytes.
pub fn recipient_field(recipient: Address) -> B256 {
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(recipient.as_slice());
    B256::from(padded)
}

pub fn recipient_from_field(field: &B256) -> Result<Address, PublicInputError> {
    if field[..12].iter().any(|b| *b != 0) {
        return Err(PublicInputError::MalformedRecipient(*field));
    }
    Ok(Address::from_slice(&field[12..]))
}

/// Parse `0x`-prefixed hex words as produced by proving backends. Short
/// words (e.g. `"0x0"`) are left-padded.
pub fn parse_public_inputs<S: AsRef<str>>(words: &[S]) -> Result<Vec<B256>, PublicInputError> {
    words
        .iter()
        .enumerate()
        .map(|(index, word)| parse_word(word.as_ref()).map_err(|reason| {
            PublicInputError::InvalidEncoding { index, reason }
        }))
        .collect()
}

fn parse_word(word: &str) -> Result<B256, String> {
    let digits = word.strip_prefix("0x").unwrap_or(word);
    if digits.is_empty() || digits.len() > 64 {
        return Err(format!("expected 1..=64 hex digits, got {}", digits.len()));
    }
    let padded = format!("{digits:0>64}");
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(&padded, &mut bytes).map_err(|e| e.to_string())?;
    Ok(B256::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WithdrawPublicInputs {
        WithdrawPublicInputs::new(
            B256::repeat_byte(0xAA),
            U256::from(1_000_000u64),
            B256::repeat_byte(0xBB),
            Address::repeat_byte(0xDE),
        )
    }

    #[test]
    fn test_positional_layout() {
        let inputs = sample().encode();
        assert_eq!(inputs.len(), MIN_PUBLIC_INPUTS);
        assert_eq!(inputs[NULLIFIER_HASH_INDEX], B256::repeat_byte(0xAA));
        assert_eq!(inputs[ROOT_INDEX], B256::repeat_byte(0xBB));
        let mut value = [0u8; 32];
        value[24..].copy_from_slice(&1_000_000u64.to_be_bytes());
        assert_eq!(inputs[VALUE_INDEX], B256::from(value));
        assert_eq!(&inputs[RECIPIENT_INDEX][..12], &[0u8; 12]);
        assert_eq!(&inputs[RECIPIENT_INDEX][12..], &[0xDEu8; 20]);
    }

    #[test]
    fn test_decode_inverts_encode_with_extras() {
        let mut pi = sample();
        pi.extra = vec![B256::repeat_byte(1), B256::repeat_byte(2)];
        assert_eq!(WithdrawPublicInputs::decode(&pi.encode()).unwrap(), pi);
    }

    #[test]
    fn test_decode_too_short() {
        let inputs = vec![B256::ZERO; 3];
        assert_eq!(
            WithdrawPublicInputs::decode(&inputs),
            Err(PublicInputError::TooFew(3))
        );
        assert_eq!(WithdrawPublicInputs::decode(&[]), Err(PublicInputError::TooFew(0)));
    }

    #[test]
    fn test_recipient_upper_bytes_must_be_zero() {
        let mut pi = sample();
        assert_eq!(pi.recipient().unwrap(), Address::repeat_byte(0xDE));
        pi.recipient_field.0[0] = 1;
        assert!(matches!(
            pi.recipient(),
            Err(PublicInputError::MalformedRecipient(_))
        ));
    }

    #[test]
    fn test_parse_public_inputs_hex() {
        let words = [
            "0x2f2db3ebc29365d92b4c3c567ec37494c011331eedf2eb88972d6a5aee08d400",
            "0x1",
            "0x0",
            "0x000000000000000000000000635BB386312470490Dd5864258bcb7Ab505bF42d",
        ];
        let parsed = parse_public_inputs(&words).unwrap();
        let pi = WithdrawPublicInputs::decode(&parsed).unwrap();
        assert_eq!(pi.value, U256::from(1u64));
        assert_eq!(pi.root, B256::ZERO);
        assert_eq!(
            pi.recipient().unwrap(),
            "0x635BB386312470490Dd5864258bcb7Ab505bF42d".parse::<Address>().unwrap()
        );

        let bad = ["0x1", "0xnothex"];
        assert!(matches!(
            parse_public_inputs(&bad),
            Err(PublicInputError::InvalidEncoding { index: 1, .. })
        ));
    }
}
