//! Client-side primitives for the shielded pool: field elements, hashes,
//! notes, withdraw public inputs and the v2b amount ciphertext.
//!
//! Everything here is pure. Ledger state lives in the `shielded-pool` crate.

pub mod ciphertext;
pub mod field;
pub mod hash;
pub mod note;
pub mod public_inputs;

pub use ciphertext::{compute_ciphertext, decrypt_ciphertext, pool_salt, AmountCipher};
pub use field::{Field, FieldError};
pub use hash::{advance_root, field_hash, keccak256, keccak256_packed, self_test, HashError};
pub use note::{generate_note, parse_note, serialize_note, GeneratedNote, Note, NoteError};
pub use public_inputs::{
    parse_public_inputs, recipient_field, recipient_from_field, PublicInputError,
    WithdrawPublicInputs,
};

pub use alloy_primitives::{Address, B256, U256};
