//! Explicit algorithm catalog.
//!
//! A `Catalog` is a plain value the caller constructs and owns; there is no
//! global registry. `Catalog::standard()` wires up the full engine, and
//! `register` lets a caller swap or extend entries (e.g. an AES instance in a
//! different mode).

use crate::algorithm::{Algorithm, AlgorithmInfo};
use crate::classical::{CaesarCipher, RunningKeyCipher, VigenereCipher};
use crate::ecc::EcdhCipher;
use crate::elgamal::ElGamalCipher;
use crate::modes::{AesCipher, AesMode};
use crate::rsa::RsaCipher;
use crate::sha256::Sha256Hash;
use crate::signature::SignatureScheme;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlgorithmId {
    Caesar,
    Vigenere,
    RunningKey,
    Aes,
    Rsa,
    ElGamal,
    Ecdh,
    Sha256,
    Signature,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 9] = [
        AlgorithmId::Caesar,
        AlgorithmId::Vigenere,
        AlgorithmId::RunningKey,
        AlgorithmId::Aes,
        AlgorithmId::Rsa,
        AlgorithmId::ElGamal,
        AlgorithmId::Ecdh,
        AlgorithmId::Sha256,
        AlgorithmId::Signature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmId::Caesar => "caesar",
            AlgorithmId::Vigenere => "vigenere",
            AlgorithmId::RunningKey => "running-key",
            AlgorithmId::Aes => "aes",
            AlgorithmId::Rsa => "rsa",
            AlgorithmId::ElGamal => "elgamal",
            AlgorithmId::Ecdh => "ecdh",
            AlgorithmId::Sha256 => "sha-256",
            AlgorithmId::Signature => "signature",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == id)
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Catalog {
    entries: Vec<(AlgorithmId, Box<dyn Algorithm>)>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The full engine with AES in its default ECB mode.
    pub fn standard() -> Self {
        Self::with_aes_mode(AesMode::Ecb)
    }

    pub fn with_aes_mode(mode: AesMode) -> Self {
        let mut catalog = Self::empty();
        catalog.register(AlgorithmId::Caesar, Box::new(CaesarCipher::new()));
        catalog.register(AlgorithmId::Vigenere, Box::new(VigenereCipher::new()));
        catalog.register(AlgorithmId::RunningKey, Box::new(RunningKeyCipher::new()));
        catalog.register(AlgorithmId::Aes, Box::new(AesCipher::new(mode)));
        catalog.register(AlgorithmId::Rsa, Box::new(RsaCipher::new()));
        catalog.register(AlgorithmId::ElGamal, Box::new(ElGamalCipher::new()));
        catalog.register(AlgorithmId::Ecdh, Box::new(EcdhCipher::new()));
        catalog.register(AlgorithmId::Sha256, Box::new(Sha256Hash::new()));
        catalog.register(AlgorithmId::Signature, Box::new(SignatureScheme::new()));
        catalog
    }

    /// Adds or replaces the entry for `id`.
    pub fn register(&mut self, id: AlgorithmId, algorithm: Box<dyn Algorithm>) {
        if let Some(slot) = self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            slot.1 = algorithm;
        } else {
            self.entries.push((id, algorithm));
        }
    }

    pub fn get(&self, id: AlgorithmId) -> Option<&dyn Algorithm> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, algorithm)| algorithm.as_ref())
    }

    pub fn entries(&self) -> impl Iterator<Item = (AlgorithmId, AlgorithmInfo)> + '_ {
        self.entries
            .iter()
            .map(|(id, algorithm)| (*id, algorithm.info()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_holds_every_algorithm() {
        let catalog = Catalog::standard();
        for id in AlgorithmId::ALL {
            assert!(catalog.get(id).is_some(), "missing {id}");
        }
        assert_eq!(catalog.entries().count(), AlgorithmId::ALL.len());
    }

    #[test]
    fn ids_parse_back() {
        for id in AlgorithmId::ALL {
            assert_eq!(AlgorithmId::parse(id.as_str()), Some(id));
        }
        assert_eq!(AlgorithmId::parse("rot13"), None);
    }

    #[test]
    fn register_replaces_an_entry() {
        let mut catalog = Catalog::standard();
        catalog.register(AlgorithmId::Aes, Box::new(AesCipher::new(AesMode::Ctr)));
        let requirements = catalog.get(AlgorithmId::Aes).unwrap().key_requirements();
        assert!(requirements.contains("CTR"));
        assert_eq!(catalog.entries().count(), AlgorithmId::ALL.len());
    }
}
