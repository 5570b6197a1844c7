//! Modes of operation wrapping the AES block engine.
//!
//! ECB and CBC carry PKCS#7 padding; CTR is a stream mode and needs none.
//! Wire format is lowercase hex with any IV/nonce prepended in the clear:
//! `hex(IV[16] || ct)` for CBC, `hex(nonce[8] || ct)` for CTR, `hex(ct)` for
//! ECB. Identical ECB plaintext blocks produce identical ciphertext blocks;
//! that weakness is the lesson, not a bug.

use std::fmt;

use rand::Rng;
use rand_core::RngCore;

use crate::aes::{self, BLOCK_BYTES, RoundKey};
use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, Tracer,
};
use crate::rng::default_rng;

/// FIPS-197 sample key, published as a convenient demonstration default.
pub const DEFAULT_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";

const IV_BYTES: usize = 16;
const NONCE_BYTES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AesMode {
    Ecb,
    Cbc,
    Ctr,
}

impl AesMode {
    pub const ALL: [AesMode; 3] = [AesMode::Ecb, AesMode::Cbc, AesMode::Ctr];

    pub fn as_str(self) -> &'static str {
        match self {
            AesMode::Ecb => "ECB",
            AesMode::Cbc => "CBC",
            AesMode::Ctr => "CTR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ECB" => Some(AesMode::Ecb),
            "CBC" => Some(AesMode::Cbc),
            "CTR" => Some(AesMode::Ctr),
            _ => None,
        }
    }
}

impl fmt::Display for AesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    if !key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("key must be a hexadecimal string (0-9, a-f)".to_string());
    }
    if !matches!(key.len(), 32 | 48 | 64) {
        return Err(
            "key must be 32 (AES-128), 48 (AES-192), or 64 (AES-256) hex characters".to_string(),
        );
    }
    Ok(())
}

fn round_keys_from_hex(key: &str) -> Result<Vec<RoundKey>, CipherError> {
    check_key(key).map_err(CipherError::invalid_key)?;
    let key_bytes = hex::decode(key).map_err(|e| CipherError::invalid_key(e.to_string()))?;
    aes::expand_key(&key_bytes)
}

fn decode_ciphertext(ciphertext: &str) -> Result<Vec<u8>, CipherError> {
    hex::decode(ciphertext.trim())
        .map_err(|_| CipherError::format("ciphertext is not valid hex"))
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let padding = BLOCK_BYTES - (data.len() % BLOCK_BYTES);
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat(padding as u8).take(padding));
    padded
}

fn pkcs7_unpad(data: &[u8]) -> Result<&[u8], CipherError> {
    let last = *data.last().ok_or(CipherError::Padding)? as usize;
    if last == 0 || last > BLOCK_BYTES || last > data.len() {
        return Err(CipherError::Padding);
    }
    let (body, padding) = data.split_at(data.len() - last);
    if padding.iter().any(|&b| b as usize != last) {
        return Err(CipherError::Padding);
    }
    Ok(body)
}

fn xor_block(block: &[u8; BLOCK_BYTES], mask: &[u8; BLOCK_BYTES]) -> [u8; BLOCK_BYTES] {
    let mut out = [0u8; BLOCK_BYTES];
    for i in 0..BLOCK_BYTES {
        out[i] = block[i] ^ mask[i];
    }
    out
}

// nonce (8 bytes) followed by the block counter, big-endian.
fn counter_block(nonce: &[u8; NONCE_BYTES], counter: u64) -> [u8; BLOCK_BYTES] {
    let mut block = [0u8; BLOCK_BYTES];
    block[..NONCE_BYTES].copy_from_slice(nonce);
    block[NONCE_BYTES..].copy_from_slice(&counter.to_be_bytes());
    block
}

fn blocks_of(data: &[u8]) -> impl Iterator<Item = [u8; BLOCK_BYTES]> + '_ {
    data.chunks_exact(BLOCK_BYTES)
        .map(|chunk| chunk.try_into().unwrap())
}

/// Encrypts UTF-8 text under the given mode, drawing IV/nonce bytes from `rng`.
pub fn encrypt_with_rng<R: Rng + ?Sized>(
    mode: AesMode,
    key: &str,
    plaintext: &str,
    rng: &mut R,
    tracer: &mut Tracer<'_>,
) -> Result<String, CipherError> {
    let round_keys = round_keys_from_hex(key)?;
    let data = plaintext.as_bytes();

    let encrypted = match mode {
        AesMode::Ecb => {
            let padded = pkcs7_pad(data);
            tracer.step_detailed(
                "PKCS#7 padding applied",
                Some(format!("{} bytes", data.len())),
                Some(format!("{} bytes", padded.len())),
                None,
            );
            let mut out = Vec::with_capacity(padded.len());
            for block in blocks_of(&padded) {
                out.extend_from_slice(&aes::encrypt_block(&block, &round_keys));
            }
            out
        }
        AesMode::Cbc => {
            let padded = pkcs7_pad(data);
            let mut iv = [0u8; IV_BYTES];
            rng.fill_bytes(&mut iv);
            tracer.step_detailed(
                "Random IV generated",
                None,
                Some(hex::encode(iv)),
                Some("IV is prepended to the ciphertext in the clear".to_string()),
            );
            let mut out = Vec::with_capacity(IV_BYTES + padded.len());
            out.extend_from_slice(&iv);
            let mut previous = iv;
            for block in blocks_of(&padded) {
                let chained = xor_block(&block, &previous);
                let encrypted = aes::encrypt_block(&chained, &round_keys);
                out.extend_from_slice(&encrypted);
                previous = encrypted;
            }
            out
        }
        AesMode::Ctr => {
            let mut nonce = [0u8; NONCE_BYTES];
            rng.fill_bytes(&mut nonce);
            tracer.step_detailed(
                "Random nonce generated",
                None,
                Some(hex::encode(nonce)),
                Some("keystream block i = AES(nonce || counter_i)".to_string()),
            );
            let mut out = Vec::with_capacity(NONCE_BYTES + data.len());
            out.extend_from_slice(&nonce);
            apply_keystream(&nonce, data, &round_keys, &mut out);
            out
        }
    };

    let hex_out = hex::encode(&encrypted);
    tracer.step_detailed(
        "Encryption finished",
        Some(plaintext.to_string()),
        Some(hex_out.clone()),
        Some(format!("mode {mode}")),
    );
    log::debug!(
        "aes encrypt mode={} plaintext_len={} ciphertext_len={}",
        mode,
        data.len(),
        encrypted.len()
    );
    Ok(hex_out)
}

/// Convenience wrapper over [`encrypt_with_rng`] using the default source.
pub fn encrypt(
    mode: AesMode,
    key: &str,
    plaintext: &str,
    tracer: &mut Tracer<'_>,
) -> Result<String, CipherError> {
    let mut rng = default_rng();
    encrypt_with_rng(mode, key, plaintext, &mut rng, tracer)
}

pub fn decrypt(
    mode: AesMode,
    key: &str,
    ciphertext: &str,
    tracer: &mut Tracer<'_>,
) -> Result<String, CipherError> {
    let round_keys = round_keys_from_hex(key)?;
    let data = decode_ciphertext(ciphertext)?;

    let plaintext_bytes = match mode {
        AesMode::Ecb => {
            if data.is_empty() || data.len() % BLOCK_BYTES != 0 {
                return Err(CipherError::format(
                    "ciphertext length must be a positive multiple of 16 bytes",
                ));
            }
            let mut out = Vec::with_capacity(data.len());
            for block in blocks_of(&data) {
                out.extend_from_slice(&aes::decrypt_block(&block, &round_keys));
            }
            pkcs7_unpad(&out)?.to_vec()
        }
        AesMode::Cbc => {
            // Minimum is one IV plus one data block.
            if data.len() < IV_BYTES + BLOCK_BYTES {
                return Err(CipherError::format(
                    "ciphertext must hold a 16-byte IV and at least one block",
                ));
            }
            let (iv, body) = data.split_at(IV_BYTES);
            if body.len() % BLOCK_BYTES != 0 {
                return Err(CipherError::format(
                    "ciphertext body length must be a multiple of 16 bytes",
                ));
            }
            tracer.step_detailed(
                "IV recovered from ciphertext",
                None,
                Some(hex::encode(iv)),
                None,
            );
            let mut out = Vec::with_capacity(body.len());
            let mut previous: [u8; BLOCK_BYTES] = iv.try_into().unwrap();
            for block in blocks_of(body) {
                let decrypted = aes::decrypt_block(&block, &round_keys);
                out.extend_from_slice(&xor_block(&decrypted, &previous));
                previous = block;
            }
            pkcs7_unpad(&out)?.to_vec()
        }
        AesMode::Ctr => {
            if data.len() <= NONCE_BYTES {
                return Err(CipherError::format(
                    "ciphertext must hold an 8-byte nonce and at least one byte",
                ));
            }
            let (nonce, body) = data.split_at(NONCE_BYTES);
            let nonce: [u8; NONCE_BYTES] = nonce.try_into().unwrap();
            tracer.step_detailed(
                "Nonce recovered from ciphertext",
                None,
                Some(hex::encode(nonce)),
                None,
            );
            let mut out = Vec::with_capacity(body.len());
            apply_keystream(&nonce, body, &round_keys, &mut out);
            out
        }
    };

    let plaintext = String::from_utf8(plaintext_bytes)
        .map_err(|_| CipherError::format("decrypted bytes are not valid UTF-8"))?;
    tracer.step_detailed(
        "Decryption finished",
        Some(ciphertext.to_string()),
        Some(plaintext.clone()),
        Some(format!("mode {mode}")),
    );
    log::debug!(
        "aes decrypt mode={} ciphertext_len={} plaintext_len={}",
        mode,
        data.len(),
        plaintext.len()
    );
    Ok(plaintext)
}

// CTR keystream XOR; the final chunk may be shorter than a block.
fn apply_keystream(
    nonce: &[u8; NONCE_BYTES],
    data: &[u8],
    round_keys: &[RoundKey],
    out: &mut Vec<u8>,
) {
    for (counter, chunk) in data.chunks(BLOCK_BYTES).enumerate() {
        let keystream = aes::encrypt_block(&counter_block(nonce, counter as u64), round_keys);
        out.extend(chunk.iter().zip(keystream.iter()).map(|(d, k)| d ^ k));
    }
}

/// AES as an engine algorithm. The mode is fixed at construction; use one
/// instance per mode instead of mutating shared state.
#[derive(Clone, Copy, Debug)]
pub struct AesCipher {
    mode: AesMode,
}

impl AesCipher {
    pub fn new(mode: AesMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> AesMode {
        self.mode
    }
}

impl Default for AesCipher {
    fn default() -> Self {
        Self::new(AesMode::Ecb)
    }
}

impl Algorithm for AesCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "AES (Advanced Encryption Standard)",
            description: "Symmetric block cipher with selectable mode of operation (ECB, CBC, CTR)",
            category: Category::Symmetric,
        }
    }

    fn validate_key(&self, key: &str) -> KeyCheck {
        match check_key(key) {
            Ok(()) => KeyCheck::ok(),
            Err(reason) => KeyCheck::fail(reason),
        }
    }

    fn key_requirements(&self) -> String {
        format!(
            "Mode: {} | hex key of 32 (AES-128), 48 (AES-192), or 64 (AES-256) characters. Default: {}",
            self.mode, DEFAULT_KEY
        )
    }

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        encrypt_with_rng(self.mode, key, plaintext, rng, tracer)
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        decrypt(self.mode, key, ciphertext, tracer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::derive_rng;
    use proptest::prelude::*;

    const KEY: &str = DEFAULT_KEY;

    fn roundtrip(mode: AesMode, text: &str) {
        let mut rng = derive_rng(b"modes-roundtrip");
        let mut tracer = Tracer::disabled();
        let ct = encrypt_with_rng(mode, KEY, text, &mut rng, &mut tracer).unwrap();
        let pt = decrypt(mode, KEY, &ct, &mut tracer).unwrap();
        assert_eq!(pt, text);
    }

    #[test]
    fn all_modes_roundtrip() {
        for mode in AesMode::ALL {
            roundtrip(mode, "The quick brown fox jumps over the lazy dog");
            roundtrip(mode, "zażółć gęślą jaźń"); // multi-byte UTF-8
        }
        // Padding lets the block modes carry the empty message; CTR (like the
        // wire format it mirrors) requires at least one body byte.
        roundtrip(AesMode::Ecb, "");
        roundtrip(AesMode::Cbc, "");
    }

    #[test]
    fn ecb_repeats_identical_blocks() {
        let mut rng = derive_rng(b"ecb-blocks");
        let mut tracer = Tracer::disabled();
        // Two identical 16-byte blocks of ASCII.
        let text = "abcdefghijklmnopabcdefghijklmnop";
        let ct = encrypt_with_rng(AesMode::Ecb, KEY, text, &mut rng, &mut tracer).unwrap();
        assert_eq!(ct[..32], ct[32..64]);
    }

    #[test]
    fn cbc_hides_identical_blocks() {
        let mut rng = derive_rng(b"cbc-blocks");
        let mut tracer = Tracer::disabled();
        let text = "abcdefghijklmnopabcdefghijklmnop";
        let ct = encrypt_with_rng(AesMode::Cbc, KEY, text, &mut rng, &mut tracer).unwrap();
        // Skip the IV (32 hex chars), then compare the two data blocks.
        assert_ne!(ct[32..64], ct[64..96]);
    }

    #[test]
    fn cbc_fresh_iv_changes_ciphertext() {
        let mut rng = derive_rng(b"cbc-iv");
        let mut tracer = Tracer::disabled();
        let a = encrypt_with_rng(AesMode::Cbc, KEY, "same text", &mut rng, &mut tracer).unwrap();
        let b = encrypt_with_rng(AesMode::Cbc, KEY, "same text", &mut rng, &mut tracer).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn ctr_preserves_length_without_padding() {
        let mut rng = derive_rng(b"ctr-length");
        let mut tracer = Tracer::disabled();
        let text = "seventeen bytes!!";
        let ct = encrypt_with_rng(AesMode::Ctr, KEY, text, &mut rng, &mut tracer).unwrap();
        // 8-byte nonce + exact text length, all hex-encoded.
        assert_eq!(ct.len(), 2 * (8 + text.len()));
    }

    #[test]
    fn cbc_rejects_short_ciphertext() {
        let mut tracer = Tracer::disabled();
        let err = decrypt(AesMode::Cbc, KEY, &"00".repeat(31), &mut tracer).unwrap_err();
        assert!(matches!(err, CipherError::Format { .. }));
    }

    #[test]
    fn ecb_rejects_ragged_ciphertext() {
        let mut tracer = Tracer::disabled();
        let err = decrypt(AesMode::Ecb, KEY, &"00".repeat(17), &mut tracer).unwrap_err();
        assert!(matches!(err, CipherError::Format { .. }));
    }

    #[test]
    fn non_hex_ciphertext_is_a_format_error() {
        let mut tracer = Tracer::disabled();
        let err = decrypt(AesMode::Ecb, KEY, "not-hex!", &mut tracer).unwrap_err();
        assert!(matches!(err, CipherError::Format { .. }));
    }

    #[test]
    fn corrupted_padding_detected() {
        // A block whose last byte is 0x00 can never carry valid PKCS#7
        // padding; encrypting it directly forges a corrupt ciphertext.
        let mut tracer = Tracer::disabled();
        let round_keys = crate::aes::expand_key(&hex::decode(KEY).unwrap()).unwrap();
        let mut block = [b'A'; BLOCK_BYTES];
        block[BLOCK_BYTES - 1] = 0x00;
        let forged = hex::encode(crate::aes::encrypt_block(&block, &round_keys));
        let err = decrypt(AesMode::Ecb, KEY, &forged, &mut tracer).unwrap_err();
        assert!(matches!(err, CipherError::Padding));
    }

    #[test]
    fn key_validation_messages_are_distinct() {
        let cipher = AesCipher::default();
        assert!(!cipher.validate_key("").valid);
        assert!(!cipher.validate_key("xyz").valid);
        assert!(!cipher.validate_key("abcd").valid);
        assert!(cipher.validate_key(DEFAULT_KEY).valid);
        assert!(cipher.validate_key(&"a".repeat(48)).valid);
        assert!(cipher.validate_key(&"a".repeat(64)).valid);
    }

    proptest! {
        #[test]
        fn pkcs7_roundtrip(data in prop::collection::vec(any::<u8>(), 0..100)) {
            let padded = pkcs7_pad(&data);
            prop_assert_eq!(padded.len() % BLOCK_BYTES, 0);
            prop_assert!(padded.len() > data.len());
            prop_assert_eq!(pkcs7_unpad(&padded).unwrap(), &data[..]);
        }

        #[test]
        fn ctr_roundtrip_arbitrary_ascii(text in "[ -~]{1,64}") {
            let mut rng = derive_rng(b"ctr-prop");
            let mut tracer = Tracer::disabled();
            let ct = encrypt_with_rng(AesMode::Ctr, KEY, &text, &mut rng, &mut tracer).unwrap();
            prop_assert_eq!(decrypt(AesMode::Ctr, KEY, &ct, &mut tracer).unwrap(), text);
        }
    }
}
