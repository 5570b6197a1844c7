//! AES block engine: key schedule, round transforms, GF(2^8) arithmetic.
//!
//! Pure and stateless per call; the mode-of-operation layer in `modes` owns
//! chaining, padding, and wire formats. The state is the standard 4x4 byte
//! matrix in column-major order.

use crate::algorithm::CipherError;

pub const BLOCK_BYTES: usize = 16;

const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

// Round constants 0x01, 0x02, 0x04, ... doubling under the AES polynomial.
const RCON: [u8; 11] = [
    0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36,
];

pub type RoundKey = [u8; BLOCK_BYTES];

type State = [[u8; 4]; 4];

/// Carry-less GF(2^8) multiplication with reduction by x^8 + x^4 + x^3 + x + 1.
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    for _ in 0..8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let hi_bit = a & 0x80;
        a <<= 1;
        if hi_bit != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    product
}

/// Expands a 16/24/32-byte key into 11/13/15 round keys.
pub fn expand_key(key: &[u8]) -> Result<Vec<RoundKey>, CipherError> {
    let key_len = key.len();
    let rounds = match key_len {
        16 => 10,
        24 => 12,
        32 => 14,
        _ => {
            return Err(CipherError::invalid_key(
                "key length must be 16, 24, or 32 bytes",
            ))
        }
    };
    let expanded_size = BLOCK_BYTES * (rounds + 1);

    let mut expanded = Vec::with_capacity(expanded_size);
    expanded.extend_from_slice(key);
    let mut rcon_iteration = 1;

    while expanded.len() < expanded_size {
        let generated = expanded.len();
        let mut word: [u8; 4] = expanded[generated - 4..generated].try_into().unwrap();

        if generated % key_len == 0 {
            // RotWord, SubWord, then XOR the round constant into the low byte.
            word.rotate_left(1);
            for byte in word.iter_mut() {
                *byte = SBOX[*byte as usize];
            }
            word[0] ^= RCON[rcon_iteration];
            rcon_iteration += 1;
        } else if key_len == 32 && generated % key_len == 16 {
            // AES-256 applies an extra SubWord mid-key.
            for byte in word.iter_mut() {
                *byte = SBOX[*byte as usize];
            }
        }

        for i in 0..4 {
            let prior = expanded[generated + i - key_len];
            expanded.push(prior ^ word[i]);
        }
    }

    Ok(expanded
        .chunks_exact(BLOCK_BYTES)
        .map(|chunk| chunk.try_into().unwrap())
        .collect())
}

fn to_state(block: &[u8; BLOCK_BYTES]) -> State {
    let mut state = [[0u8; 4]; 4];
    for row in 0..4 {
        for col in 0..4 {
            state[row][col] = block[row + 4 * col];
        }
    }
    state
}

fn from_state(state: &State) -> [u8; BLOCK_BYTES] {
    let mut block = [0u8; BLOCK_BYTES];
    for col in 0..4 {
        for row in 0..4 {
            block[row + 4 * col] = state[row][col];
        }
    }
    block
}

fn sub_bytes(state: &mut State) {
    for row in state.iter_mut() {
        for byte in row.iter_mut() {
            *byte = SBOX[*byte as usize];
        }
    }
}

fn inv_sub_bytes(state: &mut State) {
    for row in state.iter_mut() {
        for byte in row.iter_mut() {
            *byte = INV_SBOX[*byte as usize];
        }
    }
}

// Row i rotates left by i.
fn shift_rows(state: &mut State) {
    for (i, row) in state.iter_mut().enumerate() {
        row.rotate_left(i);
    }
}

fn inv_shift_rows(state: &mut State) {
    for (i, row) in state.iter_mut().enumerate() {
        row.rotate_right(i);
    }
}

fn mix_columns(state: &mut State) {
    for c in 0..4 {
        let s0 = state[0][c];
        let s1 = state[1][c];
        let s2 = state[2][c];
        let s3 = state[3][c];
        state[0][c] = gmul(s0, 2) ^ gmul(s1, 3) ^ s2 ^ s3;
        state[1][c] = s0 ^ gmul(s1, 2) ^ gmul(s2, 3) ^ s3;
        state[2][c] = s0 ^ s1 ^ gmul(s2, 2) ^ gmul(s3, 3);
        state[3][c] = gmul(s0, 3) ^ s1 ^ s2 ^ gmul(s3, 2);
    }
}

fn inv_mix_columns(state: &mut State) {
    for c in 0..4 {
        let s0 = state[0][c];
        let s1 = state[1][c];
        let s2 = state[2][c];
        let s3 = state[3][c];
        state[0][c] = gmul(s0, 14) ^ gmul(s1, 11) ^ gmul(s2, 13) ^ gmul(s3, 9);
        state[1][c] = gmul(s0, 9) ^ gmul(s1, 14) ^ gmul(s2, 11) ^ gmul(s3, 13);
        state[2][c] = gmul(s0, 13) ^ gmul(s1, 9) ^ gmul(s2, 14) ^ gmul(s3, 11);
        state[3][c] = gmul(s0, 11) ^ gmul(s1, 13) ^ gmul(s2, 9) ^ gmul(s3, 14);
    }
}

fn add_round_key(state: &mut State, round_key: &RoundKey) {
    for row in 0..4 {
        for col in 0..4 {
            state[row][col] ^= round_key[row * 4 + col];
        }
    }
}

pub fn encrypt_block(block: &[u8; BLOCK_BYTES], round_keys: &[RoundKey]) -> [u8; BLOCK_BYTES] {
    let mut state = to_state(block);
    let last = round_keys.len() - 1;

    add_round_key(&mut state, &round_keys[0]);
    for round_key in &round_keys[1..last] {
        sub_bytes(&mut state);
        shift_rows(&mut state);
        mix_columns(&mut state);
        add_round_key(&mut state, round_key);
    }
    // Final round omits MixColumns.
    sub_bytes(&mut state);
    shift_rows(&mut state);
    add_round_key(&mut state, &round_keys[last]);

    from_state(&state)
}

pub fn decrypt_block(block: &[u8; BLOCK_BYTES], round_keys: &[RoundKey]) -> [u8; BLOCK_BYTES] {
    let mut state = to_state(block);
    let last = round_keys.len() - 1;

    add_round_key(&mut state, &round_keys[last]);
    for round_key in round_keys[1..last].iter().rev() {
        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, round_key);
        inv_mix_columns(&mut state);
    }
    inv_shift_rows(&mut state);
    inv_sub_bytes(&mut state);
    add_round_key(&mut state, &round_keys[0]);

    from_state(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fips_key() -> Vec<RoundKey> {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        expand_key(&key).unwrap()
    }

    #[test]
    fn fips_197_appendix_c_vector() {
        let round_keys = fips_key();
        let block: [u8; 16] = hex::decode("00112233445566778899aabbccddeeff")
            .unwrap()
            .try_into()
            .unwrap();
        let encrypted = encrypt_block(&block, &round_keys);
        assert_eq!(hex::encode(encrypted), "69c4e0d86a7b0430d8cdb78070b4c55a");
        assert_eq!(decrypt_block(&encrypted, &round_keys), block);
    }

    #[test]
    fn key_expansion_round_counts() {
        assert_eq!(expand_key(&[0u8; 16]).unwrap().len(), 11);
        assert_eq!(expand_key(&[0u8; 24]).unwrap().len(), 13);
        assert_eq!(expand_key(&[0u8; 32]).unwrap().len(), 15);
    }

    #[test]
    fn key_expansion_fips_197_last_word() {
        // FIPS-197 A.1: expansion of 2b7e151628aed2a6abf7158809cf4f3c
        // ends with word b6630ca6.
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let round_keys = expand_key(&key).unwrap();
        let last = round_keys.last().unwrap();
        assert_eq!(hex::encode(&last[12..]), "b6630ca6");
    }

    #[test]
    fn rejects_bad_key_lengths() {
        for len in [0usize, 8, 15, 17, 33] {
            assert!(matches!(
                expand_key(&vec![0u8; len]),
                Err(CipherError::InvalidKey { .. })
            ));
        }
    }

    #[test]
    fn gmul_known_products() {
        assert_eq!(gmul(0x57, 0x83), 0xc1);
        assert_eq!(gmul(0x57, 0x13), 0xfe);
        assert_eq!(gmul(0x02, 0x80), 0x1b);
    }

    #[test]
    fn aes256_roundtrip() {
        let key = hex::decode(
            "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4",
        )
        .unwrap();
        let round_keys = expand_key(&key).unwrap();
        let block = *b"theblockof16byte";
        let encrypted = encrypt_block(&block, &round_keys);
        assert_ne!(encrypted, block);
        assert_eq!(decrypt_block(&encrypted, &round_keys), block);
    }
}
