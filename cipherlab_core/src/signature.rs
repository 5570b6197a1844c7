//! RSA-SHA256 digital signature over a fixed didactic keypair.
//!
//! The keypair comes from the textbook primes p = 61, q = 53 (n = 3233,
//! e = 17), so only the first 3 hex characters of the digest (12 bits,
//! max 4095) fit below n; that truncated value is what gets signed. The
//! signed blob is "document|digestHex|signatureHex|n,e" and verification
//! recomputes the digest before checking the exponentiation.

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::RngCore;

use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, Tracer,
};
use crate::numeric::{mod_inverse, mod_pow};
use crate::sha256;

const PRIME_P: u32 = 61;
const PRIME_Q: u32 = 53;
const PUBLIC_E: u32 = 17;
const DIGEST_PREFIX_CHARS: usize = 3;

/// Verification outcome, ordered from best to worst news.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Digest and signature both check out.
    Valid,
    /// The embedded document no longer matches the embedded digest.
    TamperedDocument,
    /// Digest matches but the signature does not open to it.
    ForgedSignature,
}

impl Verdict {
    pub fn report(self) -> &'static str {
        match self {
            Verdict::Valid => {
                "SIGNATURE VALID\n\nThe document is unchanged and originates from the signer."
            }
            Verdict::TamperedDocument => {
                "SIGNATURE INVALID\n\nThe document was modified; its digest no longer matches."
            }
            Verdict::ForgedSignature => {
                "SIGNATURE INVALID\n\nThe signature was forged or does not belong to this document."
            }
        }
    }
}

/// Signature scheme instance carrying its generated keypair.
#[derive(Debug)]
pub struct SignatureScheme {
    n: BigUint,
    e: BigUint,
    d: BigUint,
}

impl Default for SignatureScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureScheme {
    pub fn new() -> Self {
        let n = BigUint::from(PRIME_P * PRIME_Q);
        let phi = BigUint::from((PRIME_P - 1) * (PRIME_Q - 1));
        let e = BigUint::from(PUBLIC_E);
        let d = mod_inverse(&e, &phi).expect("17 is coprime to 3120");
        Self { n, e, d }
    }

    pub fn public_key(&self) -> (&BigUint, &BigUint) {
        (&self.n, &self.e)
    }

    /// First `DIGEST_PREFIX_CHARS` hex characters of the digest, reduced
    /// modulo n so the signed value always stays below the modulus.
    fn digest_to_number(hex_digest: &str, n: &BigUint) -> BigUint {
        let truncated = &hex_digest[..DIGEST_PREFIX_CHARS];
        let value = BigUint::parse_bytes(truncated.as_bytes(), 16)
            .expect("digest prefix is valid hex");
        value % n
    }

    pub fn sign(&self, document: &str, tracer: &mut Tracer<'_>) -> String {
        let digest = sha256::hex_digest(document);
        tracer.step_detailed(
            "Document digest computed",
            Some(document.to_string()),
            Some(digest.clone()),
            Some("SHA-256 over the full document".to_string()),
        );

        let digest_number = Self::digest_to_number(&digest, &self.n);
        tracer.step_detailed(
            "Digest truncated to fit the modulus",
            Some(digest.clone()),
            Some(digest_number.to_string()),
            Some(format!(
                "first {DIGEST_PREFIX_CHARS} hex chars, value below n = {}",
                self.n
            )),
        );

        let signature = mod_pow(&digest_number, &self.d, &self.n);
        let signature_hex = format!("{:04x}", signature);
        tracer.step_detailed(
            "Digest signed with the private exponent",
            Some(digest_number.to_string()),
            Some(signature_hex.clone()),
            Some("signature = digest^d mod n".to_string()),
        );

        let signed = format!("{document}|{digest}|{signature_hex}|{},{}", self.n, self.e);
        log::debug!("signature sign doc_len={} sig={}", document.len(), signature_hex);
        signed
    }

    pub fn verify(&self, signed: &str, tracer: &mut Tracer<'_>) -> Result<Verdict, CipherError> {
        let parts: Vec<&str> = signed.split('|').collect();
        if parts.len() != 4 {
            return Err(CipherError::format(
                "expected \"document|digestHex|signatureHex|n,e\"",
            ));
        }
        let (document, embedded_digest, signature_hex, public_key) =
            (parts[0], parts[1], parts[2], parts[3]);

        let current_digest = sha256::hex_digest(document);
        tracer.step_detailed(
            "Document digest recomputed",
            Some(document.to_string()),
            Some(current_digest.clone()),
            None,
        );
        if current_digest != embedded_digest {
            tracer.step_detailed(
                "Integrity check failed",
                Some(embedded_digest.to_string()),
                Some(current_digest),
                Some("embedded digest does not match the document".to_string()),
            );
            return Ok(Verdict::TamperedDocument);
        }

        let (n_str, e_str) = public_key.split_once(',').ok_or_else(|| {
            CipherError::format("public key field must be \"n,e\"")
        })?;
        let n: BigUint = n_str.trim().parse().map_err(|_| {
            CipherError::format("public key components must be integers")
        })?;
        let e: BigUint = e_str.trim().parse().map_err(|_| {
            CipherError::format("public key components must be integers")
        })?;
        if n.is_zero() {
            return Err(CipherError::format("public key modulus must be positive"));
        }

        let signature = BigUint::parse_bytes(signature_hex.trim().as_bytes(), 16)
            .ok_or_else(|| CipherError::format("signature field is not valid hex"))?;

        let expected = Self::digest_to_number(&current_digest, &n);
        let opened = mod_pow(&signature, &e, &n);
        tracer.step_detailed(
            "Signature opened with the public exponent",
            Some(signature.to_string()),
            Some(opened.to_string()),
            Some(format!("signature^{e} mod {n}")),
        );

        let verdict = if opened == expected {
            Verdict::Valid
        } else {
            Verdict::ForgedSignature
        };
        tracer.step_detailed(
            "Digest comparison",
            Some(expected.to_string()),
            Some(opened.to_string()),
            Some(format!("{verdict:?}")),
        );
        log::debug!("signature verify verdict={:?}", verdict);
        Ok(verdict)
    }
}

impl Algorithm for SignatureScheme {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "Digital Signature",
            description: "Document signing and verification composing SHA-256 with RSA",
            category: Category::Asymmetric,
        }
    }

    fn validate_key(&self, _key: &str) -> KeyCheck {
        // The scheme carries its own keypair; any key input passes.
        KeyCheck::ok()
    }

    fn key_requirements(&self) -> String {
        format!(
            "No key required: the scheme holds a generated RSA pair (n={}, e={})",
            self.n, self.e
        )
    }

    fn encrypt(
        &self,
        plaintext: &str,
        _key: &str,
        _rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        Ok(self.sign(plaintext, tracer))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        _key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        let verdict = self.verify(ciphertext, tracer)?;
        Ok(verdict.report().to_string())
    }
}
