//! RSA over deliberately small primes.
//!
//! Key generation draws two distinct primes from a configurable range, picks
//! the public exponent, and inverts it mod phi(n). The transform is the
//! classic per-character textbook form: each character code below n maps to
//! `code^e mod n`, and the ciphertext is the space-joined decimal values.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rand::Rng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, Tracer,
};
use crate::numeric::{gcd, generate_prime, mod_inverse, mod_pow};
use crate::rng::default_rng;

/// Inclusive prime sampling range for key generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimeRange {
    pub min: u64,
    pub max: u64,
}

impl PrimeRange {
    /// Default range; products comfortably exceed every BMP character code.
    pub const DEFAULT: PrimeRange = PrimeRange { min: 100, max: 300 };
    /// Smaller range for tracing keygen by hand. ASCII only.
    pub const SMALL: PrimeRange = PrimeRange { min: 50, max: 100 };
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPublicKey {
    pub e: BigUint,
    pub n: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPrivateKey {
    pub d: BigUint,
    pub n: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaKeyPair {
    pub public: RsaPublicKey,
    pub private: RsaPrivateKey,
}

impl RsaKeyPair {
    /// Key string handed back into `encrypt`.
    pub fn format_public(&self) -> String {
        format!("{},{}", self.public.e, self.public.n)
    }

    /// Key string handed back into `decrypt`.
    pub fn format_private(&self) -> String {
        format!("{},{}", self.private.d, self.private.n)
    }
}

pub fn generate_key_pair_with_rng<R: Rng + ?Sized>(
    range: PrimeRange,
    rng: &mut R,
    tracer: &mut Tracer<'_>,
) -> RsaKeyPair {
    let p = generate_prime(range.min, range.max, rng);
    tracer.step_detailed(
        "First prime p drawn",
        None,
        Some(p.to_string()),
        Some(format!("sampled from {}..={}", range.min, range.max)),
    );
    let mut q = generate_prime(range.min, range.max, rng);
    while q == p {
        q = generate_prime(range.min, range.max, rng);
    }
    tracer.step_detailed(
        "Second prime q drawn",
        None,
        Some(q.to_string()),
        Some("p and q must differ".to_string()),
    );

    let n = p * q;
    let phi = (p - 1) * (q - 1);
    tracer.step_detailed(
        "Modulus and totient computed",
        Some(format!("p={p}, q={q}")),
        Some(format!("n={n}, phi={phi}")),
        Some("n = p*q, phi = (p-1)(q-1)".to_string()),
    );

    // Prefer 65537; fall back to 17 when phi is too small, then walk upward
    // to the nearest exponent coprime with phi.
    let mut e: u64 = 65537;
    if e >= phi {
        e = 17;
    }
    while gcd(e, phi) != 1 {
        e += 1;
    }
    tracer.step_detailed(
        "Public exponent e selected",
        None,
        Some(e.to_string()),
        Some("gcd(e, phi) = 1".to_string()),
    );

    let d = mod_inverse(&BigUint::from(e), &BigUint::from(phi))
        .expect("e was chosen coprime to phi");
    tracer.step_detailed(
        "Private exponent d computed",
        Some(format!("e={e}, phi={phi}")),
        Some(d.to_string()),
        Some("d*e = 1 (mod phi)".to_string()),
    );
    log::debug!("rsa keygen p={} q={} n={} e={} d={}", p, q, n, e, d);

    RsaKeyPair {
        public: RsaPublicKey {
            e: BigUint::from(e),
            n: BigUint::from(n),
        },
        private: RsaPrivateKey {
            d,
            n: BigUint::from(n),
        },
    }
}

pub fn generate_key_pair(range: PrimeRange, tracer: &mut Tracer<'_>) -> RsaKeyPair {
    let mut rng = default_rng();
    generate_key_pair_with_rng(range, &mut rng, tracer)
}

fn check_key(key: &str) -> Result<(BigUint, BigUint), String> {
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    let parts: Vec<&str> = key.split(',').collect();
    if parts.len() != 2 {
        return Err("key must be \"exponent,modulus\" (e.g. \"17,323\")".to_string());
    }
    let exponent: BigUint = parts[0]
        .trim()
        .parse()
        .map_err(|_| "exponent and modulus must be integers".to_string())?;
    let modulus: BigUint = parts[1]
        .trim()
        .parse()
        .map_err(|_| "exponent and modulus must be integers".to_string())?;
    if exponent.is_zero() || modulus.is_zero() {
        return Err("exponent and modulus must be positive".to_string());
    }
    Ok((exponent, modulus))
}

fn parse_key(key: &str) -> Result<(BigUint, BigUint), CipherError> {
    check_key(key).map_err(CipherError::invalid_key)
}

#[derive(Debug, Default)]
pub struct RsaCipher;

impl RsaCipher {
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for RsaCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "RSA (Rivest-Shamir-Adleman)",
            description: "Asymmetric public-key cryptosystem built on integer factorization",
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
        "Public key (encrypt): \"e,n\" (e.g. \"17,323\") | Private key (decrypt): \"d,n\" \
         (e.g. \"233,323\") | exponent and modulus separated by a comma"
            .to_string()
    }

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        _rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let (e, n) = parse_key(key)?;
        tracer.step_detailed(
            "RSA parameters parsed",
            None,
            None,
            Some(format!("e={e}, n={n}")),
        );

        let mut encrypted = Vec::new();
        for (i, c) in plaintext.chars().enumerate() {
            let code = BigUint::from(c as u32);
            if code >= n {
                return Err(CipherError::range(format!(
                    "character '{c}' (code {code}) exceeds the modulus {n}; use larger primes"
                )));
            }
            let value = mod_pow(&code, &e, &n);
            if i < 3 {
                tracer.step_detailed(
                    format!("Character {} encrypted", i + 1),
                    Some(code.to_string()),
                    Some(value.to_string()),
                    Some(format!("{code}^{e} mod {n} = {value}")),
                );
            }
            encrypted.push(value.to_string());
        }

        let result = encrypted.join(" ");
        log::debug!("rsa encrypt chars={} n={}", plaintext.chars().count(), n);
        Ok(result)
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let (d, n) = parse_key(key)?;
        tracer.step_detailed(
            "RSA parameters parsed",
            None,
            None,
            Some(format!("d={d}, n={n}")),
        );

        let mut decrypted = String::new();
        for (i, token) in ciphertext.split_whitespace().enumerate() {
            let value: BigUint = token.parse().map_err(|_| {
                CipherError::format(format!("ciphertext token \"{token}\" is not a number"))
            })?;
            let code = mod_pow(&value, &d, &n);
            let c = code
                .to_u32()
                .and_then(char::from_u32)
                .ok_or_else(|| {
                    CipherError::format(format!(
                        "decrypted value {code} is not a valid character"
                    ))
                })?;
            if i < 3 {
                tracer.step_detailed(
                    format!("Token {} decrypted", i + 1),
                    Some(value.to_string()),
                    Some(format!("{code} ('{c}')")),
                    Some(format!("{value}^{d} mod {n} = {code}")),
                );
            }
            decrypted.push(c);
        }
        log::debug!("rsa decrypt tokens={}", decrypted.chars().count());
        Ok(decrypted)
    }
}
