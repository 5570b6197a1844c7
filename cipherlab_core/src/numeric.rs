//! Number-theoretic utilities shared by the asymmetric schemes.
//!
//! The algorithms are written out rather than delegated to library calls:
//! square-and-multiply exponentiation, the extended Euclidean walk, and
//! trial-division primality. `num-bigint` supplies the arbitrary-precision
//! integers they run on. Prime generation samples uniformly from a small
//! caller-given range and is explicitly demonstration-grade.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Binary (square-and-multiply) modular exponentiation.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    if modulus.is_one() {
        return BigUint::zero();
    }
    let mut result = BigUint::one();
    let mut base = base % modulus;
    let mut exponent = exponent.clone();
    let two = BigUint::from(2u8);

    while !exponent.is_zero() {
        if (&exponent % &two).is_one() {
            result = (&result * &base) % modulus;
        }
        exponent >>= 1;
        base = (&base * &base) % modulus;
    }
    result
}

/// Modular inverse via the extended Euclidean algorithm.
///
/// Returns `None` when `a` and `modulus` are not coprime.
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    if modulus.is_one() {
        return Some(BigUint::zero());
    }

    let m0 = BigInt::from(modulus.clone());
    let mut r = m0.clone();
    let mut old_r = BigInt::from(a % modulus);
    let mut s = BigInt::zero();
    let mut old_s = BigInt::one();

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    // old_r is gcd(a, modulus); an inverse exists only when it is 1.
    if !old_r.is_one() {
        return None;
    }
    let mut inverse = old_s % &m0;
    if inverse.sign() == num_bigint::Sign::Minus {
        inverse += &m0;
    }
    inverse.to_biguint()
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Trial-division primality test, adequate for the didactic ranges here.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut i = 3u64;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Samples uniformly from `min..=max` until a prime turns up.
///
/// The range must contain at least one prime or this will not return.
pub fn generate_prime<R: Rng + ?Sized>(min: u64, max: u64, rng: &mut R) -> u64 {
    let dist = Uniform::new_inclusive(min, max);
    loop {
        let candidate = dist.sample(rng);
        if is_prime(candidate) {
            return candidate;
        }
    }
}

/// Distinct prime factors of `n`, ascending.
pub fn prime_factors(n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut n = n;
    let mut i = 2u64;
    while i * i <= n {
        if n % i == 0 {
            factors.push(i);
            while n % i == 0 {
                n /= i;
            }
        }
        i += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::derive_rng;
    use proptest::prelude::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn mod_pow_small_cases() {
        assert_eq!(mod_pow(&big(4), &big(13), &big(497)), big(445));
        assert_eq!(mod_pow(&big(2), &big(10), &big(1000)), big(24));
        assert_eq!(mod_pow(&big(7), &big(0), &big(13)), big(1));
        assert_eq!(mod_pow(&big(5), &big(3), &big(1)), big(0));
    }

    #[test]
    fn mod_inverse_round_trips() {
        let inv = mod_inverse(&big(17), &big(3120)).unwrap();
        assert_eq!(inv, big(2753));
        assert_eq!((big(17) * inv) % big(3120), big(1));
    }

    #[test]
    fn mod_inverse_rejects_non_coprime() {
        assert!(mod_inverse(&big(6), &big(9)).is_none());
    }

    #[test]
    fn primality_known_values() {
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(is_prime(487));
        assert!(!is_prime(1));
        assert!(!is_prime(0));
        assert!(!is_prime(289)); // 17 * 17
        assert!(!is_prime(1000));
    }

    #[test]
    fn generated_primes_stay_in_range() {
        let mut rng = derive_rng(b"prime-range");
        for _ in 0..32 {
            let p = generate_prime(100, 300, &mut rng);
            assert!((100..=300).contains(&p));
            assert!(is_prime(p));
        }
    }

    #[test]
    fn factors_of_composite() {
        assert_eq!(prime_factors(360), vec![2, 3, 5]);
        assert_eq!(prime_factors(486), vec![2, 3]);
        assert_eq!(prime_factors(97), vec![97]);
    }

    proptest! {
        #[test]
        fn mod_pow_matches_library_oracle(
            base in 0u64..10_000,
            exponent in 0u64..10_000,
            modulus in 2u64..10_000,
        ) {
            let ours = mod_pow(&big(base), &big(exponent), &big(modulus));
            let oracle = big(base).modpow(&big(exponent), &big(modulus));
            prop_assert_eq!(ours, oracle);
        }

        #[test]
        fn mod_inverse_inverts(a in 1u64..10_000, m in 2u64..10_000) {
            prop_assume!(gcd(a, m) == 1);
            let inv = mod_inverse(&big(a), &big(m)).unwrap();
            prop_assert_eq!((big(a) * inv) % big(m), big(1));
        }

        #[test]
        fn gcd_divides_both(a in 1u64..100_000, b in 1u64..100_000) {
            let g = gcd(a, b);
            prop_assert!(g > 0);
            prop_assert_eq!(a % g, 0);
            prop_assert_eq!(b % g, 0);
            prop_assert_eq!(g, num_integer::gcd(a, b));
        }
    }
}
