//! Shielded notes.
//!
//!   commitment    = poseidon(secret, nullifier_seed, value)
//!   nullifierHash = poseidon(nullifier_seed)
//!
//! A note never leaves the client; only its commitment (at deposit) and its
//! nullifier hash (at withdrawal) appear on the ledger.

use crate::field::Field;
use crate::hash::{field_hash, HashError};
use alloy_primitives::{B256, U256};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix of the compact note string.
pub const NOTE_PREFIX: &str = "shielded-note-v1-0x";

/// Hex length of the compact note body: secret ‖ nullifier_seed ‖ value.
const NOTE_BODY_HEX_LEN: usize = 3 * 64;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("note value must be non-zero")]
    ZeroValue,
    #[error("note value {0} does not fit in the BN254 scalar field")]
    ValueOutOfField(U256),
    #[error("malformed note: {0}")]
    MalformedNote(String),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// A shielded note representing ownership of `value` tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub secret: Field,
    pub nullifier_seed: Field,
    /// Token amount, hashed as a field element by the circuit.
    pub value: Field,
}

/// A note together with its public identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedNote {
    pub note: Note,
    pub commitment: B256,
    pub nullifier_hash: B256,
}

impl Note {
    /// Build a note, checking `value` is a non-zero field element.
    pub fn new(value: U256, secret: Field, nullifier_seed: Field) -> Result<Self, NoteError> {
        if value.is_zero() {
            return Err(NoteError::ZeroValue);
        }
        let value = Field::from_u256(value).map_err(|_| NoteError::ValueOutOfField(value))?;
        Ok(Note {
            secret,
            nullifier_seed,
            value,
        })
    }

    pub fn amount(&self) -> U256 {
        self.value.to_u256()
    }

    /// commitment = poseidon(secret, nullifier_seed, value)
    pub fn commitment(&self) -> Result<B256, HashError> {
        field_hash(&[self.secret, self.nullifier_seed, self.value]).map(|f| f.to_b256())
    }

    /// nullifierHash = poseidon(nullifier_seed)
    pub fn nullifier_hash(&self) -> Result<B256, HashError> {
        field_hash(&[self.nullifier_seed]).map(|f| f.to_b256())
    }

    pub fn derive(self) -> Result<GeneratedNote, HashError> {
        Ok(GeneratedNote {
            commitment: self.commitment()?,
            nullifier_hash: self.nullifier_hash()?,
            note: self,
        })
    }
}

// =============================================================================
//                          NOTE GENERATION
// =============================================================================

/// Generate a note and its identifiers. A missing nullifier seed is drawn
/// from the thread RNG.
pub fn generate_note(
    value: U256,
    secret: Field,
    nullifier_seed: Option<Field>,
) -> Result<GeneratedNote, NoteError> {
    generate_note_with_rng(value, secret, nullifier_seed, &mut rand::thread_rng())
}

pub fn generate_note_with_rng<R: RngCore + ?Sized>(
    value: U256,
    secret: Field,
    nullifier_seed: Option<Field>,
    rng: &mut R,
) -> Result<GeneratedNote, NoteError> {
    let nullifier_seed = nullifier_seed.unwrap_or_else(|| Field::random(rng));
    let note = Note::new(value, secret, nullifier_seed)?;
    Ok(note.derive()?)
}

// =============================================================================
//                          COMPACT STRING FORM
// =============================================================================

pub fn serialize_note(note: &Note) -> String {
    format!(
        "{NOTE_PREFIX}{}{}{}",
        hex::encode(note.secret.to_be_bytes()),
        hex::encode(note.nullifier_seed.to_be_bytes()),
        hex::encode(note.value.to_be_bytes()),
    )
}

pub fn parse_note(s: &str) -> Result<Note, NoteError> {
    let body = s
        .strip_prefix(NOTE_PREFIX)
        .ok_or_else(|| NoteError::MalformedNote(format!("missing prefix {NOTE_PREFIX}")))?;
    if body.len() != NOTE_BODY_HEX_LEN {
        return Err(NoteError::MalformedNote(format!(
            "expected {NOTE_BODY_HEX_LEN} hex digits, got {}",
            body.len()
        )));
    }
    let mut bytes = [0u8; 96];
    hex::decode_to_slice(body, &mut bytes)
        .map_err(|e| NoteError::MalformedNote(e.to_string()))?;

    let word = |i: usize| -> Result<Field, NoteError> {
        let mut w = [0u8; 32];
        w.copy_from_slice(&bytes[i * 32..(i + 1) * 32]);
        Field::from_be_bytes(&w).map_err(|e| NoteError::MalformedNote(e.to_string()))
    };
    let secret = word(0)?;
    let nullifier_seed = word(1)?;
    let value = word(2)?;
    if value.is_zero() {
        return Err(NoteError::MalformedNote("zero value".to_string()));
    }
    Ok(Note {
        secret,
        nullifier_seed,
        value,
    })
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_note(self))
    }
}

impl FromStr for Note {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_note(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        Note::new(U256::from(1u64), Field::from(2), Field::from(100)).unwrap()
    }

    #[test]
    fn test_note_commitment_deterministic() {
        let a = generate_note(U256::from(1_000_000u64), Field::from(7), Some(Field::from(9))).unwrap();
        let b = generate_note(U256::from(1_000_000u64), Field::from(7), Some(Field::from(9))).unwrap();
        assert_eq!(a.commitment, b.commitment);
        assert_eq!(a.nullifier_hash, b.nullifier_hash);
        assert_ne!(a.commitment, a.nullifier_hash);
    }

    #[test]
    fn test_nullifier_depends_only_on_seed() {
        let a = generate_note(U256::from(5u64), Field::from(1), Some(Field::from(42))).unwrap();
        let b = generate_note(U256::from(6u64), Field::from(2), Some(Field::from(42))).unwrap();
        assert_eq!(a.nullifier_hash, b.nullifier_hash);
        assert_ne!(a.commitment, b.commitment);
    }

    #[test]
    fn test_random_seed_differs() {
        let a = generate_note(U256::from(5u64), Field::from(1), None).unwrap();
        let b = generate_note(U256::from(5u64), Field::from(1), None).unwrap();
        assert_ne!(a.note.nullifier_seed, b.note.nullifier_seed);
        assert_ne!(a.commitment, b.commitment);
    }

    #[test]
    fn test_zero_value_rejected() {
        assert_eq!(
            generate_note(U256::ZERO, Field::from(1), None).unwrap_err(),
            NoteError::ZeroValue
        );
    }

    #[test]
    fn test_value_outside_field_rejected() {
        assert_eq!(
            generate_note(U256::MAX, Field::from(1), None).unwrap_err(),
            NoteError::ValueOutOfField(U256::MAX)
        );
    }

    #[test]
    fn test_string_roundtrip() {
        let note = sample();
        let s = serialize_note(&note);
        assert!(s.starts_with(NOTE_PREFIX));
        assert_eq!(parse_note(&s).unwrap(), note);
        assert_eq!(note.to_string().parse::<Note>().unwrap(), note);
    }

    #[test]
    fn test_string_roundtrip_at_field_boundary() {
        let max = Field::max_value();
        let note = Note::new(max.to_u256(), max, max).unwrap();
        assert_eq!(parse_note(&serialize_note(&note)).unwrap(), note);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let good = serialize_note(&sample());
        let cases = [
            String::new(),
            "shielded-note-v0-0x00".to_string(),
            good[..good.len() - 2].to_string(),
            format!("{good}00"),
            good.replace('0', "g"),
            // value word set to the field modulus
            format!(
                "{}{}",
                &good[..NOTE_PREFIX.len() + 128],
                "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001"
            ),
            // zero value
            format!("{}{}", &good[..NOTE_PREFIX.len() + 128], "0".repeat(64)),
        ];
        for case in cases {
            assert!(
                matches!(parse_note(&case), Err(NoteError::MalformedNote(_))),
                "accepted {case:?}"
            );
        }
    }

    #[test]
    fn test_generated_note_json() {
        let generated = sample().derive().unwrap();
        let json = serde_json::to_string_pretty(&generated).unwrap();
        let parsed: GeneratedNote = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, generated);
    }
}
