//! ElGamal over a small prime field.
//!
//! Key generation searches for a primitive root of a freshly drawn prime by
//! factoring phi(p) and checking the generator criterion. Encryption is
//! randomized per character through an ephemeral exponent, so equal
//! plaintexts never repeat on the wire; each character becomes an "a:b" pair.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, Tracer,
};
use crate::numeric::{gcd, generate_prime, is_prime, mod_inverse, mod_pow, prime_factors};
use crate::rng::default_rng;

// Primes in this range keep every BMP character code below p while staying
// small enough to trace by hand.
const PRIME_MIN: u64 = 300;
const PRIME_MAX: u64 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalPublicKey {
    pub p: BigUint,
    pub g: BigUint,
    pub y: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalPrivateKey {
    pub x: BigUint,
    pub p: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalKeyPair {
    pub public: ElGamalPublicKey,
    pub private: ElGamalPrivateKey,
}

impl ElGamalKeyPair {
    pub fn format_public(&self) -> String {
        format!("{},{},{}", self.public.p, self.public.g, self.public.y)
    }

    pub fn format_private(&self) -> String {
        format!("{},{}", self.private.x, self.private.p)
    }
}

/// Smallest primitive root of `p`, verified against every prime factor of
/// phi(p) = p-1.
fn find_primitive_root(p: u64) -> u64 {
    let phi = p - 1;
    let factors = prime_factors(phi);
    let big_p = BigUint::from(p);
    'candidates: for g in 2..=p {
        for factor in &factors {
            let probe = mod_pow(
                &BigUint::from(g),
                &BigUint::from(phi / factor),
                &big_p,
            );
            if probe == BigUint::from(1u8) {
                continue 'candidates;
            }
        }
        return g;
    }
    unreachable!("every prime has a primitive root");
}

pub fn generate_key_pair_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    tracer: &mut Tracer<'_>,
) -> ElGamalKeyPair {
    let p = generate_prime(PRIME_MIN, PRIME_MAX, rng);
    tracer.step_detailed(
        "Prime modulus p drawn",
        None,
        Some(p.to_string()),
        Some(format!("sampled from {PRIME_MIN}..={PRIME_MAX}")),
    );

    let g = find_primitive_root(p);
    tracer.step_detailed(
        "Generator g found",
        None,
        Some(g.to_string()),
        Some(format!("smallest primitive root modulo {p}")),
    );

    let x = Uniform::new(2, p).sample(rng);
    tracer.step_detailed(
        "Private exponent x drawn",
        None,
        Some(x.to_string()),
        Some(format!("1 < x < {p}")),
    );

    let y = mod_pow(&BigUint::from(g), &BigUint::from(x), &BigUint::from(p));
    tracer.step_detailed(
        "Public value y computed",
        Some(format!("g={g}, x={x}, p={p}")),
        Some(y.to_string()),
        Some("y = g^x mod p".to_string()),
    );
    log::debug!("elgamal keygen p={} g={} y={}", p, g, y);

    ElGamalKeyPair {
        public: ElGamalPublicKey {
            p: BigUint::from(p),
            g: BigUint::from(g),
            y,
        },
        private: ElGamalPrivateKey {
            x: BigUint::from(x),
            p: BigUint::from(p),
        },
    }
}

pub fn generate_key_pair(tracer: &mut Tracer<'_>) -> ElGamalKeyPair {
    let mut rng = default_rng();
    generate_key_pair_with_rng(&mut rng, tracer)
}

enum ParsedKey {
    Public { p: u64, g: u64, y: u64 },
    Private { x: u64, p: u64 },
}

fn check_key(key: &str) -> Result<ParsedKey, String> {
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    let parts: Vec<&str> = key.split(',').map(str::trim).collect();
    let numbers: Result<Vec<u64>, _> = parts.iter().map(|s| s.parse::<u64>()).collect();
    match parts.len() {
        3 => {
            let values = numbers.map_err(|_| "key components must be integers".to_string())?;
            let (p, g, y) = (values[0], values[1], values[2]);
            if !is_prime(p) {
                return Err("p must be a prime number".to_string());
            }
            // The ephemeral exponent needs room in (0, p-1).
            if p < 5 {
                return Err("p is too small to encrypt anything".to_string());
            }
            Ok(ParsedKey::Public { p, g, y })
        }
        2 => {
            let values = numbers.map_err(|_| "key components must be integers".to_string())?;
            if values[1] < 2 {
                return Err("modulus p must be at least 2".to_string());
            }
            Ok(ParsedKey::Private {
                x: values[0],
                p: values[1],
            })
        }
        _ => Err("invalid key format; public: \"p,g,y\", private: \"x,p\"".to_string()),
    }
}

#[derive(Debug, Default)]
pub struct ElGamalCipher;

impl ElGamalCipher {
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for ElGamalCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "ElGamal",
            description: "Asymmetric cryptosystem built on the discrete logarithm problem",
            category: Category::Asymmetric,
        }
    }

    fn validate_key(&self, key: &str) -> KeyCheck {
        match check_key(key) {
            Ok(_) => KeyCheck::ok(),
            Err(reason) => KeyCheck::fail(reason),
        }
    }

    fn key_requirements(&self) -> String {
        "Public key (encrypt): \"p,g,y\" (e.g. \"467,2,132\") | Private key (decrypt): \
         \"x,p\" (e.g. \"123,467\")"
            .to_string()
    }

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let (p, g, y) = match check_key(key).map_err(CipherError::invalid_key)? {
            ParsedKey::Public { p, g, y } => (p, g, y),
            ParsedKey::Private { .. } => {
                return Err(CipherError::invalid_key(
                    "encryption requires the public key \"p,g,y\"",
                ))
            }
        };
        let big_p = BigUint::from(p);
        let big_g = BigUint::from(g);
        let big_y = BigUint::from(y);
        let ephemeral = Uniform::new(1, p - 1);

        let mut pairs = Vec::new();
        for (i, c) in plaintext.chars().enumerate() {
            let m = BigUint::from(c as u32);
            if m >= big_p {
                return Err(CipherError::range(format!(
                    "character '{c}' (code {m}) exceeds the modulus p={p}; generate larger keys"
                )));
            }

            // Fresh ephemeral exponent per character, coprime to p-1.
            let mut k = ephemeral.sample(rng);
            while gcd(k, p - 1) != 1 {
                k = ephemeral.sample(rng);
            }

            let a = mod_pow(&big_g, &BigUint::from(k), &big_p);
            let b = (mod_pow(&big_y, &BigUint::from(k), &big_p) * &m) % &big_p;
            if i < 3 {
                tracer.step_detailed(
                    format!("Character {} encrypted", i + 1),
                    Some(format!("m={m}, k={k}")),
                    Some(format!("a={a}, b={b}")),
                    Some(format!("a = {g}^{k} mod {p}; b = ({y}^{k} * {m}) mod {p}")),
                );
            }
            pairs.push(format!("{a}:{b}"));
        }

        log::debug!(
            "elgamal encrypt chars={} p={}",
            plaintext.chars().count(),
            p
        );
        Ok(pairs.join(" "))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let (x, p) = match check_key(key).map_err(CipherError::invalid_key)? {
            ParsedKey::Private { x, p } => (x, p),
            ParsedKey::Public { .. } => {
                return Err(CipherError::invalid_key(
                    "decryption requires the private key \"x,p\"",
                ))
            }
        };
        let big_p = BigUint::from(p);
        let big_x = BigUint::from(x);

        let mut decrypted = String::new();
        for (i, pair) in ciphertext.split_whitespace().enumerate() {
            let (a_str, b_str) = pair.split_once(':').ok_or_else(|| {
                CipherError::format(format!("ciphertext pair \"{pair}\" is missing ':'"))
            })?;
            let a: BigUint = a_str.parse().map_err(|_| {
                CipherError::format(format!("ciphertext pair \"{pair}\" is not numeric"))
            })?;
            let b: BigUint = b_str.parse().map_err(|_| {
                CipherError::format(format!("ciphertext pair \"{pair}\" is not numeric"))
            })?;

            // m = b * (a^x)^-1 mod p
            let s = mod_pow(&a, &big_x, &big_p);
            let s_inv = mod_inverse(&s, &big_p).ok_or_else(|| {
                CipherError::format(format!("shared value {s} is not invertible modulo {p}"))
            })?;
            let m = (b * s_inv) % &big_p;
            let c = m
                .to_u32()
                .and_then(char::from_u32)
                .ok_or_else(|| {
                    CipherError::format(format!("decrypted value {m} is not a valid character"))
                })?;
            if i < 3 {
                tracer.step_detailed(
                    format!("Pair {} decrypted", i + 1),
                    Some(pair.to_string()),
                    Some(format!("m={m} ('{c}')")),
                    Some(format!("s = {a}^{x} mod {p}; m = b * s^-1 mod {p}")),
                );
            }
            decrypted.push(c);
        }
        log::debug!("elgamal decrypt pairs={}", decrypted.chars().count());
        Ok(decrypted)
    }
}
