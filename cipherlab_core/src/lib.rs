//! Educational cryptographic algorithm engine, implemented from first
//! principles.
//!
//! Every primitive here is written out by hand for study: the AES round
//! transforms, the modular arithmetic behind RSA and ElGamal, elliptic-curve
//! point operations, and the SHA-256 compression function. The implementation
//! intentionally favors clarity and traceability over performance and must
//! **not** be used for production security: key sizes are tiny and the
//! default randomness source is not cryptographically strong.

pub mod aes;
pub mod algorithm;
pub mod catalog;
pub mod classical;
pub mod ecc;
pub mod elgamal;
pub mod modes;
pub mod numeric;
pub mod rng;
pub mod rsa;
pub mod sha256;
pub mod signature;

pub use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, StepLog, TraceSink, TraceStep,
    Tracer,
};
pub use crate::catalog::{AlgorithmId, Catalog};
pub use crate::classical::{CaesarCipher, RunningKeyCipher, VigenereCipher};
pub use crate::ecc::{CurvePoint, EcKeyPair, EcdhCipher};
pub use crate::elgamal::{ElGamalCipher, ElGamalKeyPair};
pub use crate::modes::{AesCipher, AesMode, DEFAULT_KEY};
pub use crate::rng::{default_rng, derive_rng, DefaultRng};
pub use crate::rsa::{PrimeRange, RsaCipher, RsaKeyPair};
pub use crate::sha256::Sha256Hash;
pub use crate::signature::{SignatureScheme, Verdict};
