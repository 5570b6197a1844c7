//! Elliptic-curve key agreement on a fixed toy curve, demonstrated as a
//! simplified ECIES.
//!
//! Curve: y^2 = x^3 + 5x + 19 over F_487, base point G = (17, 141). Point
//! arithmetic uses the chord/tangent formulas with modular inverses for the
//! slope; scalar multiplication is double-and-add. The "stream" derived from
//! the shared secret is a single repeated key byte taken from S.x, a
//! documented teaching simplification rather than a real KDF.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::algorithm::{
    Algorithm, AlgorithmInfo, Category, CipherError, KeyCheck, Tracer,
};
use crate::numeric::mod_inverse;
use crate::rng::default_rng;

const CURVE_P: u32 = 487;
const CURVE_A: u32 = 5;
const CURVE_B: u32 = 19;
// (3, 99) satisfies the curve equation; the curve group has prime order 467,
// so every non-identity point generates it.
const BASE_X: u32 = 3;
const BASE_Y: u32 = 99;
const GROUP_ORDER: u32 = 467;

/// Affine point; `infinity` marks the additive identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: BigInt,
    pub y: BigInt,
    pub infinity: bool,
}

impl CurvePoint {
    pub fn new(x: BigInt, y: BigInt) -> Self {
        Self {
            x,
            y,
            infinity: false,
        }
    }

    pub fn infinity() -> Self {
        Self {
            x: BigInt::zero(),
            y: BigInt::zero(),
            infinity: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcKeyPair {
    pub private: BigUint,
    pub public: CurvePoint,
}

impl EcKeyPair {
    pub fn format_public(&self) -> String {
        format!("{},{}", self.public.x, self.public.y)
    }

    pub fn format_private(&self) -> String {
        self.private.to_string()
    }
}

fn field_p() -> BigInt {
    BigInt::from(CURVE_P)
}

fn base_point() -> CurvePoint {
    CurvePoint::new(BigInt::from(BASE_X), BigInt::from(BASE_Y))
}

/// Reduces into the canonical range [0, p).
fn modp(value: &BigInt) -> BigInt {
    let p = field_p();
    let mut v = value % &p;
    if v.sign() == Sign::Minus {
        v += &p;
    }
    v
}

fn inv_modp(value: &BigInt) -> Option<BigInt> {
    let reduced = modp(value).to_biguint()?;
    let inverse = mod_inverse(&reduced, &BigUint::from(CURVE_P))?;
    Some(BigInt::from(inverse))
}

/// True when the point satisfies y^2 = x^3 + ax + b (mod p).
pub fn is_on_curve(point: &CurvePoint) -> bool {
    if point.infinity {
        return true;
    }
    let lhs = modp(&(&point.y * &point.y));
    let rhs = modp(
        &(&point.x * &point.x * &point.x + BigInt::from(CURVE_A) * &point.x + BigInt::from(CURVE_B)),
    );
    lhs == rhs
}

fn add_points(lhs: &CurvePoint, rhs: &CurvePoint) -> CurvePoint {
    if lhs.infinity {
        return rhs.clone();
    }
    if rhs.infinity {
        return lhs.clone();
    }

    // Adding a point to its negation collapses to the identity; this also
    // covers doubling a point whose y is zero.
    if lhs.x == rhs.x && modp(&(&lhs.y + &rhs.y)).is_zero() {
        return CurvePoint::infinity();
    }

    let slope = if lhs.x == rhs.x && lhs.y == rhs.y {
        // Tangent: (3x^2 + a) / 2y
        let numerator = modp(&(BigInt::from(3) * &lhs.x * &lhs.x + BigInt::from(CURVE_A)));
        let denominator = inv_modp(&(BigInt::from(2) * &lhs.y))
            .expect("2y is nonzero here and p is prime");
        modp(&(numerator * denominator))
    } else {
        // Chord: (y2 - y1) / (x2 - x1)
        let numerator = modp(&(&rhs.y - &lhs.y));
        let denominator = inv_modp(&(&rhs.x - &lhs.x))
            .expect("x1 != x2 here and p is prime");
        modp(&(numerator * denominator))
    };

    let x3 = modp(&(&slope * &slope - &lhs.x - &rhs.x));
    let y3 = modp(&(&slope * (&lhs.x - &x3) - &lhs.y));
    CurvePoint::new(x3, y3)
}

/// Double-and-add scalar multiplication.
fn multiply_point(scalar: &BigUint, point: &CurvePoint) -> CurvePoint {
    let mut result = CurvePoint::infinity();
    let mut addend = point.clone();
    let mut k = scalar.clone();
    let one = BigUint::one();

    while !k.is_zero() {
        if (&k & &one) == one {
            result = add_points(&result, &addend);
        }
        addend = add_points(&addend, &addend);
        k >>= 1;
    }
    result
}

pub fn generate_key_pair_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    tracer: &mut Tracer<'_>,
) -> EcKeyPair {
    tracer.step_detailed(
        "Curve parameters",
        None,
        None,
        Some(format!(
            "y^2 = x^3 + {CURVE_A}x + {CURVE_B} (mod {CURVE_P}), G = ({BASE_X}, {BASE_Y})"
        )),
    );
    let d = Uniform::new(1u32, GROUP_ORDER).sample(rng);
    let private = BigUint::from(d);
    let public = multiply_point(&private, &base_point());
    tracer.step_detailed(
        "Key pair derived",
        Some(format!("d = {d}")),
        Some(format!("Q = ({}, {})", public.x, public.y)),
        Some("Q = d * G".to_string()),
    );
    log::debug!("ecdh keygen d={} qx={} qy={}", d, public.x, public.y);
    EcKeyPair { private, public }
}

pub fn generate_key_pair(tracer: &mut Tracer<'_>) -> EcKeyPair {
    let mut rng = default_rng();
    generate_key_pair_with_rng(&mut rng, tracer)
}

fn check_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    if key.contains(',') {
        let parts: Vec<&str> = key.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err("public key must be \"x,y\"".to_string());
        }
        for part in parts {
            part.parse::<BigInt>()
                .map_err(|_| "coordinates must be integers".to_string())?;
        }
    } else {
        key.trim()
            .parse::<BigUint>()
            .map_err(|_| "private key must be a non-negative integer".to_string())?;
    }
    Ok(())
}

// Coordinates are canonicalized into [0, p) so the equality checks inside the
// addition formulas are meaningful.
fn parse_point(text: &str) -> Result<CurvePoint, CipherError> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| CipherError::format(format!("point \"{text}\" must be \"x,y\"")))?;
    let x: BigInt = x
        .trim()
        .parse()
        .map_err(|_| CipherError::format(format!("point coordinate \"{x}\" is not a number")))?;
    let y: BigInt = y
        .trim()
        .parse()
        .map_err(|_| CipherError::format(format!("point coordinate \"{y}\" is not a number")))?;
    Ok(CurvePoint::new(modp(&x), modp(&y)))
}

// The shared secret's x-coordinate reduced to one byte keys the XOR stream.
fn derive_key_byte(shared: &CurvePoint) -> u8 {
    (modp(&shared.x) % BigInt::from(256))
        .to_u8()
        .expect("value reduced below 256")
}

#[derive(Debug, Default)]
pub struct EcdhCipher;

impl EcdhCipher {
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for EcdhCipher {
    fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: "ECDH (Elliptic Curve Diffie-Hellman)",
            description: "Elliptic-curve key agreement, demonstrated as a simplified ECIES",
            category: Category::Asymmetric,
        }
    }

    fn validate_key(&self, key: &str) -> KeyCheck {
        match check_key(key) {
            Ok(()) => KeyCheck::ok(),
            Err(reason) => KeyCheck::fail(reason),
        }
    }

    fn key_requirements(&self) -> String {
        "Public key (encrypt): \"x,y\" | Private key (decrypt): a single integer".to_string()
    }

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        check_key(key).map_err(CipherError::invalid_key)?;
        if !key.contains(',') {
            return Err(CipherError::invalid_key(
                "encryption requires the recipient public key \"x,y\"",
            ));
        }
        let recipient = parse_point(key)?;
        if !is_on_curve(&recipient) {
            return Err(CipherError::invalid_key(
                "public key point does not lie on the curve",
            ));
        }

        let k = BigUint::from(Uniform::new(1u32, GROUP_ORDER).sample(rng));
        let ephemeral = multiply_point(&k, &base_point());
        tracer.step_detailed(
            "Ephemeral key pair generated",
            None,
            Some(format!("k={k}, R=({}, {})", ephemeral.x, ephemeral.y)),
            Some("R = k * G travels with the ciphertext".to_string()),
        );

        let shared = multiply_point(&k, &recipient);
        if shared.infinity {
            return Err(CipherError::DegeneratePoint);
        }
        tracer.step_detailed(
            "Shared secret agreed",
            Some(format!("Q=({}, {})", recipient.x, recipient.y)),
            Some(format!("S = k*Q = ({}, {})", shared.x, shared.y)),
            None,
        );

        let key_byte = derive_key_byte(&shared);
        tracer.step_detailed(
            "Symmetric key byte derived from S.x",
            Some(shared.x.to_string()),
            Some(key_byte.to_string()),
            Some("a real ECIES would run S through a KDF".to_string()),
        );

        let body: Vec<u8> = plaintext.as_bytes().iter().map(|b| b ^ key_byte).collect();
        let result = format!("{},{}|{}", ephemeral.x, ephemeral.y, hex::encode(body));
        log::debug!(
            "ecies encrypt bytes={} rx={} ry={}",
            plaintext.len(),
            ephemeral.x,
            ephemeral.y
        );
        Ok(result)
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError> {
        check_key(key).map_err(CipherError::invalid_key)?;
        if key.contains(',') {
            return Err(CipherError::invalid_key(
                "decryption requires the private key (a single integer)",
            ));
        }
        let d: BigUint = key
            .trim()
            .parse()
            .map_err(|_| CipherError::invalid_key("private key must be an integer"))?;

        let (point_text, body_hex) = ciphertext.split_once('|').ok_or_else(|| {
            CipherError::format("expected \"Rx,Ry|hex\" with a '|' separator")
        })?;
        let ephemeral = parse_point(point_text)?;
        if !is_on_curve(&ephemeral) {
            return Err(CipherError::format(
                "ephemeral point does not lie on the curve",
            ));
        }
        tracer.step_detailed(
            "Ephemeral point recovered",
            Some(ciphertext.to_string()),
            Some(format!("R = ({}, {})", ephemeral.x, ephemeral.y)),
            None,
        );

        let shared = multiply_point(&d, &ephemeral);
        if shared.infinity {
            return Err(CipherError::DegeneratePoint);
        }
        let key_byte = derive_key_byte(&shared);
        tracer.step_detailed(
            "Shared secret recomputed",
            Some(format!("d={d}")),
            Some(format!("S = d*R = ({}, {})", shared.x, shared.y)),
            None,
        );

        let body = hex::decode(body_hex.trim())
            .map_err(|_| CipherError::format("ciphertext body is not valid hex"))?;
        let bytes: Vec<u8> = body.iter().map(|b| b ^ key_byte).collect();
        let plaintext = String::from_utf8(bytes)
            .map_err(|_| CipherError::format("decrypted bytes are not valid UTF-8"))?;
        log::debug!("ecies decrypt bytes={}", plaintext.len());
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::derive_rng;

    #[test]
    fn base_point_lies_on_the_curve() {
        assert!(is_on_curve(&base_point()));
    }

    #[test]
    fn addition_preserves_curve_membership() {
        let g = base_point();
        let mut acc = CurvePoint::infinity();
        for _ in 0..20 {
            acc = add_points(&acc, &g);
            assert!(is_on_curve(&acc));
        }
    }

    #[test]
    fn infinity_is_the_additive_identity() {
        let g = base_point();
        assert_eq!(add_points(&g, &CurvePoint::infinity()), g);
        assert_eq!(add_points(&CurvePoint::infinity(), &g), g);
    }

    #[test]
    fn point_plus_negation_is_infinity() {
        let g = base_point();
        let neg = CurvePoint::new(g.x.clone(), modp(&-&g.y));
        assert!(add_points(&g, &neg).infinity);
    }

    #[test]
    fn scalar_multiplication_matches_repeated_addition() {
        let g = base_point();
        let mut sum = CurvePoint::infinity();
        for k in 1u32..=10 {
            sum = add_points(&sum, &g);
            assert_eq!(multiply_point(&BigUint::from(k), &g), sum);
        }
    }

    #[test]
    fn generated_public_key_is_d_times_g() {
        let mut rng = derive_rng(b"ecdh-keygen");
        let mut tracer = Tracer::disabled();
        let pair = generate_key_pair_with_rng(&mut rng, &mut tracer);
        assert!(is_on_curve(&pair.public));
        assert_eq!(multiply_point(&pair.private, &base_point()), pair.public);
    }

    #[test]
    fn ecies_roundtrip() {
        let mut rng = derive_rng(b"ecies-roundtrip");
        let mut tracer = Tracer::disabled();
        let pair = generate_key_pair_with_rng(&mut rng, &mut tracer);
        let cipher = EcdhCipher::new();
        let text = "shared secrets";
        let ct = cipher
            .encrypt(text, &pair.format_public(), &mut rng, &mut tracer)
            .unwrap();
        assert!(ct.contains('|'));
        let pt = cipher
            .decrypt(&ct, &pair.format_private(), &mut tracer)
            .unwrap();
        assert_eq!(pt, text);
    }

    #[test]
    fn ecies_is_randomized() {
        let mut rng = derive_rng(b"ecies-randomized");
        let mut tracer = Tracer::disabled();
        let pair = generate_key_pair_with_rng(&mut rng, &mut tracer);
        let cipher = EcdhCipher::new();
        let first = cipher
            .encrypt("hello", &pair.format_public(), &mut rng, &mut tracer)
            .unwrap();
        let second = cipher
            .encrypt("hello", &pair.format_public(), &mut rng, &mut tracer)
            .unwrap();
        assert_ne!(first, second);
        let key = pair.format_private();
        assert_eq!(cipher.decrypt(&first, &key, &mut tracer).unwrap(), "hello");
        assert_eq!(cipher.decrypt(&second, &key, &mut tracer).unwrap(), "hello");
    }

    #[test]
    fn off_curve_public_key_rejected() {
        let cipher = EcdhCipher::new();
        let mut rng = derive_rng(b"ecies-off-curve");
        let mut tracer = Tracer::disabled();
        // (1, 1) fails the curve equation.
        let err = cipher
            .encrypt("hi", "1,1", &mut rng, &mut tracer)
            .unwrap_err();
        assert!(matches!(err, CipherError::InvalidKey { .. }));
    }

    #[test]
    fn missing_separator_is_a_format_error() {
        let cipher = EcdhCipher::new();
        let mut tracer = Tracer::disabled();
        let err = cipher.decrypt("3,99deadbeef", "5", &mut tracer).unwrap_err();
        assert!(matches!(err, CipherError::Format { .. }));
    }

    #[test]
    fn key_validation_rules() {
        let cipher = EcdhCipher::new();
        assert!(cipher.validate_key("17,141").valid);
        assert!(cipher.validate_key("42").valid);
        assert!(!cipher.validate_key("").valid);
        assert!(!cipher.validate_key("17,141,5").valid);
        assert!(!cipher.validate_key("x,y").valid);
        assert!(!cipher.validate_key("-5").valid);
    }
}
