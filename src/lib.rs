//! # Serpent
//!
//! `serpent-cipher` is an implementation of the
//! [Serpent cipher](https://www.cl.cam.ac.uk/~rja14/serpent.html) most
//! known for being one of the leading candidates for AES.
//!
//! The cipher is implemented in both of its published formulations: the
//! standard form (initial permutation, 32 rounds of key mixing, S-boxes
//! and the table-based linear transformation, final permutation) and the
//! bitslice form, which runs the same 32 rounds over four 32-bit words
//! with the linear transformation expressed as rotate/shift equations.
//! The two produce identical ciphertext for every block and key, and the
//! test suite holds them to that.
//!
//! Known-answer vectors validate the implementation at every accepted
//! key length.
//!
//! For easy interoperation with Rust crypto this crate implements
//! the `BlockCipher` trait from the `block-cipher-trait` crate.

mod bitslice;
mod keys;
mod tables;
mod transforms;

pub use block_cipher_trait;
pub use block_cipher_trait::generic_array;
pub use generic_array::typenum;

use block_cipher_trait::BlockCipher;
use generic_array::GenericArray;
use std::convert::TryInto;
use std::fmt;
use typenum::{U1, U16, U32};

use bitslice::{
    apply_lt_bitslice, apply_lt_bitslice_inv, apply_s_bitslice, apply_s_bitslice_inv, quad_join,
    quad_split, xor_words,
};
use transforms::{apply_permutation, apply_s_hat, apply_s_hat_inv, apply_xor_table};

const PHI: u32 = 0x9e37_79b9;
const ROUNDS: usize = 32;

/// 128-bit pattern shared by the unit tests across modules.
#[cfg(test)]
pub(crate) const TEST_BLOCK: u128 = 0xa54a_9529_5a92_6a94_ea52_991d_4a94_ca73;

/// Errors surfaced while constructing a cipher instance from key
/// material. Block operations themselves cannot fail: a block is always
/// exactly a `u128` and a nibble always four bits, so there is nothing
/// left to check at encryption time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Key length in bits is not a multiple of 32 within 64..=256.
    KeyLength { bits: usize },
    /// Text key is empty or contains a non-hexadecimal character.
    KeyFormat,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::KeyLength { bits } => write!(
                f,
                "key length of {} bits is not a multiple of 32 in 64..=256",
                bits
            ),
            Error::KeyFormat => write!(f, "text key is not a string of hex digits"),
        }
    }
}

impl std::error::Error for Error {}

/// The Serpent cipher instance
///
/// Holds the round subkeys derived from one user key; the schedule is
/// computed once and shared by every block operation, in both the
/// standard and the bitslice formulation. Implements a friendly `u128`
/// interface as well as the common Rust crypto
/// `block_cipher_trait::BlockCipher` trait for easy use in stream cipher
/// algorithms.
pub struct Serpent {
    subkeys: keys::Subkeys,
}

impl Serpent {
    /// Constructs an instance from a little-endian binary key. Key
    /// length must be a multiple of 32 bits between 64 and 256; shorter
    /// keys are canonically padded to 256 bits.
    pub fn with_binary_key(key: &[u8]) -> Result<Serpent, Error> {
        let expanded_key = keys::expand_key(key, key.len() * 8)?;
        Ok(Serpent {
            subkeys: keys::derive_subkeys(expanded_key),
        })
    }

    /// Constructs an instance from a big-endian text representation
    /// of a hexadecimal key, e.g. `"abcdef0123456789"`.
    pub fn with_text_key(key: &str) -> Result<Serpent, Error> {
        let (binary_key, len_bits) = keys::parse_text_key(key)?;
        let expanded_key = keys::expand_key(&binary_key, len_bits)?;
        Ok(Serpent {
            subkeys: keys::derive_subkeys(expanded_key),
        })
    }

    /// Encryption of a block stored in a 128-bit little-endian integer,
    /// in the standard formulation.
    pub fn encrypt_block(&self, block: u128) -> u128 {
        let mut b_hat = apply_permutation(&tables::IP, block);
        for i in 0..ROUNDS {
            b_hat = do_round(i, b_hat, &self.subkeys.k_hat);
        }
        apply_permutation(&tables::FP, b_hat)
    }

    /// Decryption of a block stored in a 128-bit little-endian integer,
    /// in the standard formulation.
    pub fn decrypt_block(&self, block: u128) -> u128 {
        let mut b_hat = apply_permutation(&tables::IP, block);
        for i in (0..ROUNDS).rev() {
            b_hat = do_round_inv(i, b_hat, &self.subkeys.k_hat);
        }
        apply_permutation(&tables::FP, b_hat)
    }

    /// Encryption in the bitslice formulation: the same 32 rounds over
    /// four 32-bit words, with no outer permutations. Byte-identical to
    /// `encrypt_block` for every input.
    pub fn encrypt_block_bitslice(&self, block: u128) -> u128 {
        let mut b = quad_split(block);
        for i in 0..ROUNDS {
            b = do_round_bitslice(i, b, &self.subkeys.k);
        }
        quad_join(b)
    }

    /// Decryption in the bitslice formulation. Byte-identical to
    /// `decrypt_block` for every input.
    pub fn decrypt_block_bitslice(&self, block: u128) -> u128 {
        let mut b = quad_split(block);
        for i in (0..ROUNDS).rev() {
            b = do_round_bitslice_inv(i, b, &self.subkeys.k);
        }
        quad_join(b)
    }
}

/// Implements BlockCipher with 256-bit keys as the favoured fixed key length.
/// Other variable key lengths are not yet implemented.
impl BlockCipher for Serpent {
    type KeySize = U32;
    type BlockSize = U16;
    type ParBlocks = U1;

    fn new(key: &GenericArray<u8, U32>) -> Self {
        Serpent::with_binary_key(&key).unwrap()
    }

    fn encrypt_block(&self, block: &mut GenericArray<u8, Self::BlockSize>) {
        let input = u128::from_le_bytes(block.as_slice().try_into().unwrap());
        let output = self.encrypt_block(input);
        block.copy_from_slice(&u128::to_le_bytes(output));
    }

    fn decrypt_block(&self, block: &mut GenericArray<u8, Self::BlockSize>) {
        let input = u128::from_le_bytes(block.as_slice().try_into().unwrap());
        let output = self.decrypt_block(input);
        block.copy_from_slice(&u128::to_le_bytes(output));
    }
}

fn do_round(i: usize, b_hat_i: u128, k_hat: &[u128; ROUNDS + 1]) -> u128 {
    assert!(i < ROUNDS, "round index {} out of range", i);
    let xored = b_hat_i ^ k_hat[i];
    let s_hat_i = apply_s_hat(i, xored);
    if i <= ROUNDS - 2 {
        apply_xor_table(&tables::LT, s_hat_i)
    } else {
        // the last round swaps the linear transformation for a second
        // key mix
        s_hat_i ^ k_hat[ROUNDS]
    }
}

fn do_round_inv(i: usize, b_hat_i_plus_1: u128, k_hat: &[u128; ROUNDS + 1]) -> u128 {
    assert!(i < ROUNDS, "round index {} out of range", i);
    let s_hat_i = if i <= ROUNDS - 2 {
        apply_xor_table(&tables::LT_INV, b_hat_i_plus_1)
    } else {
        b_hat_i_plus_1 ^ k_hat[ROUNDS]
    };
    let xored = apply_s_hat_inv(i, s_hat_i);
    xored ^ k_hat[i]
}

fn do_round_bitslice(i: usize, b_i: [u32; 4], k: &[u128; ROUNDS + 1]) -> [u32; 4] {
    assert!(i < ROUNDS, "round index {} out of range", i);
    let s_i = apply_s_bitslice(i, xor_words(b_i, quad_split(k[i])));
    if i <= ROUNDS - 2 {
        apply_lt_bitslice(s_i)
    } else {
        xor_words(s_i, quad_split(k[ROUNDS]))
    }
}

fn do_round_bitslice_inv(i: usize, b_i_plus_1: [u32; 4], k: &[u128; ROUNDS + 1]) -> [u32; 4] {
    assert!(i < ROUNDS, "round index {} out of range", i);
    let s_i = if i <= ROUNDS - 2 {
        apply_lt_bitslice_inv(b_i_plus_1)
    } else {
        xor_words(b_i_plus_1, quad_split(k[ROUNDS]))
    };
    xor_words(apply_s_bitslice_inv(i, s_i), quad_split(k[i]))
}
