use crate::bitslice::{apply_s_bitslice, quad_join};
use crate::tables::IP;
use crate::transforms::apply_permutation;
use crate::Error;
use crate::PHI;
use crate::ROUNDS;

pub(crate) type Key = [u8; 32];

/// The 33 round subkeys in both of their forms: `k` feeds the bitslice
/// rounds, `k_hat` the standard rounds, and `k_hat[i]` is the initial
/// permutation of `k[i]`.
pub(crate) struct Subkeys {
    pub(crate) k: [u128; ROUNDS + 1],
    pub(crate) k_hat: [u128; ROUNDS + 1],
}

/// Parses a big-endian hexadecimal key into little-endian bytes plus its
/// bit length. Validation of the length happens in `expand_key`.
pub(crate) fn parse_text_key(key: &str) -> Result<(Vec<u8>, usize), Error> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || bytes.iter().any(|b| !b.is_ascii_hexdigit()) {
        return Err(Error::KeyFormat);
    }
    let mut parsed = vec![0u8; (bytes.len() + 1) / 2];
    for (place, digit) in bytes.iter().rev().enumerate() {
        let nibble = match digit {
            b'0'..=b'9' => digit - b'0',
            b'a'..=b'f' => digit - b'a' + 10,
            b'A'..=b'F' => digit - b'A' + 10,
            _ => unreachable!(),
        };
        let offset = (place & 1) * 4;
        parsed[place / 2] |= nibble << offset;
    }
    Ok((parsed, bytes.len() * 4))
}

/// Pads a user key out to the canonical 256 bits: one `1` bit directly
/// after the key material, zeros to the end. Accepted lengths are the
/// multiples of 32 in 64..=256; everything else is an error.
pub(crate) fn expand_key(source: &[u8], len_bits: usize) -> Result<Key, Error> {
    if len_bits % 32 != 0 || len_bits < 64 || len_bits > 256 {
        return Err(Error::KeyLength { bits: len_bits });
    }
    debug_assert_eq!(source.len() * 8, len_bits);

    let mut key = [0u8; 32];
    key[..source.len()].copy_from_slice(source);
    if len_bits < 256 {
        key[len_bits / 8] |= 1;
    }
    Ok(key)
}

pub(crate) fn derive_subkeys(key: Key) -> Subkeys {
    use byteorder::{ByteOrder, LE};
    use std::convert::TryInto;

    let mut w = [0u32; 140];
    LE::read_u32_into(&key, &mut w[..8]);

    for i in 0..132 {
        let slot = i + 8;
        w[slot] = (w[slot - 8] ^ w[slot - 5] ^ w[slot - 3] ^ w[slot - 1] ^ PHI ^ i as u32)
            .rotate_left(11);
    }

    // The first eight slots held the user key words; the prekeys proper
    // start at slot 8.
    let w = &w[8..];
    let mut k = [0u128; ROUNDS + 1];
    let mut k_hat = [0u128; ROUNDS + 1];
    for i in 0..=ROUNDS {
        let s_idx = (ROUNDS + 3 - i) % ROUNDS;
        let src: [u32; 4] = w[4 * i..4 * i + 4].try_into().unwrap();
        k[i] = quad_join(apply_s_bitslice(s_idx, src));
        k_hat[i] = apply_permutation(&IP, k[i]);
    }

    Subkeys { k, k_hat }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_BLOCK;

    #[test]
    fn parse_keys() {
        // 128 bits of text key become 16 little-endian bytes
        let (bytes, len_bits) = parse_text_key("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(len_bits, 128);
        assert_eq!(
            bytes,
            [
                0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01, //
                0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01, //
            ]
        );

        assert_eq!(parse_text_key("not hex"), Err(crate::Error::KeyFormat));
        assert_eq!(parse_text_key(""), Err(crate::Error::KeyFormat));
    }

    #[test]
    fn expand_pads_with_a_single_one_bit() {
        // 128-bit key: the 0x01 sentinel byte lands halfway through
        let key = expand_key(&[0xff; 16], 128).unwrap();
        assert_eq!(&key[..16], &[0xff; 16][..]);
        assert_eq!(key[16], 0x01);
        assert_eq!(&key[17..], &[0x00; 15][..]);

        // 224-bit key: sentinel in the last word
        let key = expand_key(&[0xab; 28], 224).unwrap();
        assert_eq!(key[28], 0x01);
        assert_eq!(&key[29..], &[0x00; 3][..]);

        // 256-bit key passes through untouched
        let key = expand_key(&[0x5a; 32], 256).unwrap();
        assert_eq!(key, [0x5a; 32]);
    }

    #[test]
    fn expand_rejects_bad_lengths() {
        assert_eq!(
            expand_key(&[0u8; 4], 32),
            Err(crate::Error::KeyLength { bits: 32 })
        );
        assert_eq!(
            expand_key(&[0u8; 36], 288),
            Err(crate::Error::KeyLength { bits: 288 })
        );
        assert!(expand_key(&[0u8; 8], 64).is_ok());
        assert!(expand_key(&[0u8; 20], 160).is_ok());
    }

    #[test]
    fn subkey_vectors() {
        let key = expand_key(&TEST_BLOCK.to_le_bytes(), 128).unwrap();
        let subkeys = derive_subkeys(key);
        assert_eq!(subkeys.k[3], 0xdd69_b4c0_47e8_0d4c_51c0_9a3f_8b2a_eb62);
        assert_eq!(subkeys.k_hat[3], 0x9e0a_9c5f_6ed0_d018_b19a_7c35_8d32_6632);
        assert_eq!(subkeys.k[13], 0xd724_fade_b335_7f85_4cb4_6033_a50b_3f2b);
        assert_eq!(subkeys.k_hat[15], 0xac5d_08c6_5ab2_056b_8f5b_a51a_7b91_3b2d);
    }

    #[test]
    fn k_hat_is_permuted_k() {
        let key = expand_key(&TEST_BLOCK.to_le_bytes(), 128).unwrap();
        let subkeys = derive_subkeys(key);
        for i in 0..=ROUNDS {
            assert_eq!(subkeys.k_hat[i], apply_permutation(&IP, subkeys.k[i]));
        }
    }
}
