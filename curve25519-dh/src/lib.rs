//! Curve25519 field/group primitives and the X25519 key-agreement entry
//! points (spec §4.2 / §4.4.1).
//!
//! Grounded on `typed-io-cryptoxide::curve25519` and `typed-io-cryptoxide::x25519`:
//! the Montgomery-ladder `scalarmult` loop (clamping, the per-step
//! `d/b/a/c/da/cb/bb/aa/t0/t1/x4/e/t2/t3/x5/t4/z5/z4` arithmetic, and the
//! base-point `mul_small::<9>` shortcut) and the `SecretKey`/`PublicKey`/
//! `SharedSecret` newtype API shape (`dh`/`base`) are carried over
//! unchanged; only the field backend (`field::Fe`) and the error type
//! (`CoreError` in place of a unit `()` / no error at all) differ from
//! the teacher.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod field;

use field::{cswap, Fe};
use stream_cipher_core::CoreError;

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// A Curve25519 private scalar, pre-clamping.
#[derive(Clone)]
#[cfg_attr(feature = "zeroize", derive(Zeroize))]
#[cfg_attr(feature = "zeroize", zeroize(drop))]
pub struct SecretKey([u8; 32]);

/// A Curve25519 u-coordinate public key. Any 32-byte string is accepted;
/// per spec §4.4.1 this layer MUST NOT reject non-canonical encodings
/// (RFC 7748 compatibility).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; 32]);

/// The raw 32-byte Diffie-Hellman output, before any optional
/// key-derivation step is applied.
#[derive(Clone)]
#[cfg_attr(feature = "zeroize", derive(Zeroize))]
#[cfg_attr(feature = "zeroize", zeroize(drop))]
pub struct SharedSecret([u8; 32]);

impl From<[u8; 32]> for SecretKey {
    fn from(v: [u8; 32]) -> Self {
        SecretKey(v)
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = CoreError;

    fn try_from(value: &[u8]) -> Result<Self, CoreError> {
        <[u8; 32]>::try_from(value)
            .map(SecretKey)
            .map_err(|_| CoreError::InvalidArgument)
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(v: [u8; 32]) -> Self {
        PublicKey(v)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CoreError;

    fn try_from(value: &[u8]) -> Result<Self, CoreError> {
        <[u8; 32]>::try_from(value)
            .map(PublicKey)
            .map_err(|_| CoreError::InvalidArgument)
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for SharedSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// `priv[0] &= 0xF8; priv[31] &= 0x7F; priv[31] |= 0x40` (spec §4.2,
/// "Private-key clamping").
fn clamp(n: &[u8; 32]) -> [u8; 32] {
    let mut e = *n;
    e[0] &= 0b1111_1000;
    e[31] &= 0b0111_1111;
    e[31] |= 0b0100_0000;
    e
}

/// The Montgomery ladder, `scalarmult(q, n, p)` computing `n * P` on
/// Curve25519 (spec §4.2). `e` MUST already be clamped. `base_point`
/// selects the fixed-base shortcut (`x1` is always the constant `9`, so
/// the `z5` cross term collapses to a small-constant multiply instead of
/// a general field multiplication).
fn ladder(e: &[u8; 32], x1: Fe, base_point: bool) -> [u8; 32] {
    let mut x2 = Fe::ONE;
    let mut z2 = Fe::ZERO;
    let mut x3 = x1;
    let mut z3 = Fe::ONE;

    let mut swap: u8 = 0;
    for pos in (0usize..255).rev() {
        let b = (e[pos / 8] >> (pos & 7)) & 1;
        cswap(swap ^ b, &mut x2, &mut x3);
        cswap(swap ^ b, &mut z2, &mut z3);
        swap = b;

        let d = &x3 - &z3;
        let b = &x2 - &z2;
        let a = &x2 + &z2;
        let c = &x3 + &z3;
        let da = &d * &a;
        let cb = &c * &b;
        let bb = b.square();
        let aa = a.square();
        let t0 = &da + &cb;
        let t1 = &da - &cb;
        let x4 = &aa * &bb;
        let e_term = &aa - &bb;
        let t2 = t1.square();
        let t3 = e_term.mul_small(121_666);
        let x5 = t0.square();
        let t4 = &bb + &t3;
        let z5 = if base_point {
            t2.mul_small(9)
        } else {
            &x1 * &t2
        };
        let z4 = &e_term * &t4;

        z2 = z4;
        z3 = z5;
        x2 = x4;
        x3 = x5;
    }
    cswap(swap, &mut x2, &mut x3);
    cswap(swap, &mut z2, &mut z3);

    (&z2.invert() * &x2).to_bytes()
}

const BASE_U: [u8; 32] = {
    let mut b = [0u8; 32];
    b[0] = 9;
    b
};

/// Derives a public key from a private key: `scalarmult(priv, 9)` (spec
/// §4.2, "Public key"). Equivalent to, but faster than,
/// `scalarmult(secret, &PublicKey::from(BASE_U))`.
pub fn base(secret: &SecretKey) -> PublicKey {
    let e = clamp(&secret.0);
    PublicKey(ladder(&e, Fe::from_bytes(&BASE_U), true))
}

/// Computes the shared secret `scalarmult(priv_A, pub_B)` (spec §4.4.1,
/// X25519). Accepts any 32-byte peer public key without validation, per
/// the RFC 7748 compatibility requirement.
pub fn dh(secret: &SecretKey, peer: &PublicKey) -> SharedSecret {
    let e = clamp(&secret.0);
    SharedSecret(ladder(&e, Fe::from_bytes(&peer.0), false))
}

/// Converts an Ed25519 group element's affine `(Y, Z)` coordinates to the
/// corresponding Curve25519 Montgomery u-coordinate: `montX = (Z+Y)/(Z-Y)`
/// (spec §4.2, "Edwards-to-Montgomery X conversion").
pub fn edwards_to_montgomery_x(y: &[u8; 32], z: &[u8; 32]) -> [u8; 32] {
    let y = Fe::from_bytes(y);
    let z = Fe::from_bytes(z);
    let numerator = &z + &y;
    let denominator = &z - &y;
    (&numerator * &denominator.invert()).to_bytes()
}

/// Passes a raw Diffie-Hellman output through HSalsa20 with an all-zero
/// 16-byte nonce to produce the final shared key (spec §4.2, "optional
/// NaCl-compatibility mode"). Requires the `nacl-compat` feature, which
/// pulls in the `salsa20` crate purely for its `hsalsa` function.
#[cfg(feature = "nacl-compat")]
pub fn nacl_compat_shared_key(shared: &SharedSecret) -> [u8; 32] {
    salsa20::hsalsa(&shared.0, &[0u8; 16], 20)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 7748 §5.2 X25519 test vectors (spec §8, "MUST be validated
    // against the RFC 7748 §5.2 published test vectors").
    #[test]
    fn x25519_matches_rfc7748_vector_1() {
        let scalar = hex!("a546e36bf0527c9d3b16154b82465edd62144c0ac1fc5a18506a2244ba449ac");
        let u = hex!("e6db6867583030db3594c1a424b15f7c726624ec26b3353b10a903a6d0ab1c4");
        let expected = hex!("c3da55379de9c6908e94ea4df28d084f32eccf03491c71f754b4075577a2852");

        let secret = SecretKey::from(scalar);
        let peer = PublicKey::from(u);
        let shared = dh(&secret, &peer);
        assert_eq!(shared.0, expected);
    }

    #[test]
    fn x25519_matches_rfc7748_vector_2() {
        let scalar = hex!("4b66e9d4d1b4673c5ad22691957d6af5c11b6421e0ea01d42ca4169e7918ba0");
        let u = hex!("e5210f12786811d3f4b7959d0538ae2c31dbe7106fc03c3efc4cd549c715a49");
        let expected = hex!("95cbde9476e8907d7aade45cb4b873f88b595a68799fa152e6f8f7647aac797");

        let secret = SecretKey::from(scalar);
        let peer = PublicKey::from(u);
        let shared = dh(&secret, &peer);
        assert_eq!(shared.0, expected);
    }

    #[test]
    fn clamping_matches_spec_bit_pattern() {
        let raw = [0xffu8; 32];
        let clamped = clamp(&raw);
        assert_eq!(clamped[0] & 0b0000_0111, 0);
        assert_eq!(clamped[31] & 0b1000_0000, 0);
        assert_eq!(clamped[31] & 0b0100_0000, 0b0100_0000);
    }

    #[test]
    fn dh_is_symmetric() {
        let a = SecretKey::from([
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
            25, 26, 27, 28, 29, 30, 31, 32,
        ]);
        let b = SecretKey::from([
            32, 31, 30, 29, 28, 27, 26, 25, 24, 23, 22, 21, 20, 19, 18, 17, 16, 15, 14, 13, 12,
            11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1,
        ]);
        let pub_a = base(&a);
        let pub_b = base(&b);
        let shared_ab = dh(&a, &pub_b);
        let shared_ba = dh(&b, &pub_a);
        assert_eq!(shared_ab.0, shared_ba.0);
    }

    #[test]
    fn accepts_any_peer_public_bytes() {
        let secret = SecretKey::from([7u8; 32]);
        // all-1s is not a canonical point encoding; must still accept it
        // per RFC 7748 compatibility.
        let peer = PublicKey::from([0xffu8; 32]);
        let shared = dh(&secret, &peer);
        assert_eq!(shared.0.len(), 32);
    }

    #[cfg(feature = "nacl-compat")]
    #[test]
    fn nacl_compat_mode_derives_32_bytes() {
        let a = SecretKey::from([9u8; 32]);
        let b = SecretKey::from([11u8; 32]);
        let shared = dh(&a, &base(&b));
        let key = nacl_compat_shared_key(&shared);
        assert_eq!(key.len(), 32);
    }
}
