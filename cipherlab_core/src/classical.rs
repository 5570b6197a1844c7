//! Classical letter-shift ciphers: Caesar, Vigenère, and the running-key
//! variant.
//!
//! All three share the same arithmetic: shift letters mod 26, preserve case,
//! pass non-letters through untouched. The running-key cipher generates a
//! filler key as long as the plaintext's letter count and bundles it with the
//! ciphertext as "key::ciphertext".

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_core::RngCore;

use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, Tracer,
};

const ALPHABET: u8 = 26;

fn shift_letter(c: char, shift: i32) -> char {
    let (base, code) = match c {
        'A'..='Z' => (b'A', c as u8 - b'A'),
        'a'..='z' => (b'a', c as u8 - b'a'),
        _ => return c,
    };
    let shifted = (code as i32 + shift).rem_euclid(ALPHABET as i32) as u8;
    (base + shifted) as char
}

fn caesar_transform(text: &str, shift: i32) -> String {
    text.chars().map(|c| shift_letter(c, shift)).collect()
}

/// Vigenère-family transform. `key_letters` must be uppercase ASCII; the key
/// index advances only on letters and wraps cyclically.
fn polyalphabetic(text: &str, key_letters: &[u8], encrypt: bool) -> Result<String, CipherError> {
    if key_letters.is_empty() {
        if text.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(CipherError::format(
                "key must contain at least one letter",
            ));
        }
        return Ok(text.to_string());
    }

    let mut key_index = 0usize;
    let result = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                let key_code = (key_letters[key_index % key_letters.len()] - b'A') as i32;
                key_index += 1;
                let shift = if encrypt { key_code } else { -key_code };
                shift_letter(c, shift)
            } else {
                c
            }
        })
        .collect();
    Ok(result)
}

fn uppercase_letters(key: &str) -> Vec<u8> {
    key.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase() as u8)
        .collect()
}

// ---------------------------------------------------------------------------
// Caesar
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CaesarCipher;

impl CaesarCipher {
    pub fn new() -> Self {
        Self
    }
}

fn caesar_shift(key: &str) -> Result<i32, String> {
    let shift: i32 = key
        .trim()
        .parse()
        .map_err(|_| "key must be an integer".to_string())?;
    if !(1..=25).contains(&shift) {
        return Err("key must be between 1 and 25".to_string());
    }
    Ok(shift)
}

impl Algorithm for CaesarCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "Caesar Cipher",
            description: "Classic substitution cipher shifting letters by a fixed amount",
            category: Category::Classical,
        }
    }

    fn validate_key(&self, key: &str) -> KeyCheck {
        match caesar_shift(key) {
            Ok(_) => KeyCheck::ok(),
            Err(reason) => KeyCheck::fail(reason),
        }
    }

    fn key_requirements(&self) -> String {
        "An integer from 1 to 25 (the alphabet shift)".to_string()
    }

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        _rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let shift = caesar_shift(key).map_err(CipherError::invalid_key)?;
        let result = caesar_transform(plaintext, shift);
        tracer.step_detailed(
            "Letters shifted forward",
            Some(plaintext.to_string()),
            Some(result.clone()),
            Some(format!("shift = {shift}")),
        );
        Ok(result)
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let shift = caesar_shift(key).map_err(CipherError::invalid_key)?;
        let result = caesar_transform(ciphertext, -shift);
        tracer.step_detailed(
            "Letters shifted back",
            Some(ciphertext.to_string()),
            Some(result.clone()),
            Some(format!("shift = -{shift}")),
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Vigenère
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct VigenereCipher;

impl VigenereCipher {
    pub fn new() -> Self {
        Self
    }
}

fn check_vigenere_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    if !key.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("key may contain only letters (A-Z, a-z)".to_string());
    }
    Ok(())
}

impl Algorithm for VigenereCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "Vigenère Cipher",
            description: "Polyalphabetic cipher driven by a repeating keyword",
            category: Category::Classical,
        }
    }

    fn validate_key(&self, key: &str) -> KeyCheck {
        match check_vigenere_key(key) {
            Ok(()) => KeyCheck::ok(),
            Err(reason) => KeyCheck::fail(reason),
        }
    }

    fn key_requirements(&self) -> String {
        "A word or phrase made of letters only (A-Z)".to_string()
    }

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        _rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        check_vigenere_key(key).map_err(CipherError::invalid_key)?;
        let result = polyalphabetic(plaintext, &uppercase_letters(key), true)?;
        tracer.step_detailed(
            "Keyword shifts applied",
            Some(plaintext.to_string()),
            Some(result.clone()),
            Some(format!("keyword length {}", key.len())),
        );
        Ok(result)
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        check_vigenere_key(key).map_err(CipherError::invalid_key)?;
        let result = polyalphabetic(ciphertext, &uppercase_letters(key), false)?;
        tracer.step_detailed(
            "Keyword shifts reversed",
            Some(ciphertext.to_string()),
            Some(result.clone()),
            None,
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Running key
// ---------------------------------------------------------------------------

const KEY_SEPARATOR: &str = "::";

// Filler vocabulary for generated running keys, lorem-ipsum flavored.
const FILLER_WORDS: [&str; 24] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
    "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "enim", "minim", "veniam",
    "quis", "nostrud", "exercitation", "ullamco", "laboris", "aliquip",
];

/// Draws filler words until `length` letters exist, then truncates.
fn generate_filler<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
    let mut letters = String::with_capacity(length);
    if length == 0 {
        return letters;
    }
    let dist = Uniform::new(0, FILLER_WORDS.len());
    while letters.len() < length {
        letters.push_str(FILLER_WORDS[dist.sample(rng)]);
    }
    letters.truncate(length);
    letters
}

#[derive(Debug, Default)]
pub struct RunningKeyCipher;

impl RunningKeyCipher {
    pub fn new() -> Self {
        Self
    }
}

fn check_running_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    if !key.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err("key may contain only letters and spaces (A-Z, a-z)".to_string());
    }
    let letters = key.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if letters < 5 {
        return Err("key must contain at least 5 letters (spaces allowed)".to_string());
    }
    Ok(())
}

impl Algorithm for RunningKeyCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "Running Key Cipher",
            description: "Vigenère-style cipher keyed by generated text as long as the message",
            category: Category::Classical,
        }
    }

    fn validate_key(&self, key: &str) -> KeyCheck {
        match check_running_key(key) {
            Ok(()) => KeyCheck::ok(),
            Err(reason) => KeyCheck::fail(reason),
        }
    }

    fn key_requirements(&self) -> String {
        "The key is generated automatically to match the message length and travels \
         bundled with the ciphertext as \"key::ciphertext\""
            .to_string()
    }

    fn encrypt(
        &self,
        plaintext: &str,
        _key: &str,
        rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let needed = plaintext.chars().filter(|c| c.is_ascii_alphabetic()).count();
        let key = generate_filler(needed, rng);
        tracer.step_detailed(
            "Running key generated",
            Some(format!("{needed} letters needed")),
            Some(key.clone()),
            Some("the key travels with the ciphertext".to_string()),
        );
        let ciphertext = polyalphabetic(plaintext, &uppercase_letters(&key), true)?;
        Ok(format!("{key}{KEY_SEPARATOR}{ciphertext}"))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        _key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let (key, body) = ciphertext.split_once(KEY_SEPARATOR).ok_or_else(|| {
            CipherError::format("expected \"key::ciphertext\"; the '::' separator is missing")
        })?;
        tracer.step_detailed(
            "Bundled key recovered",
            Some(ciphertext.to_string()),
            Some(key.to_string()),
            None,
        );
        polyalphabetic(body, &uppercase_letters(key), false)
    }
}
