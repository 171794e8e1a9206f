//! Scalar multiplication: window-NAF for variable-base, and key
//! generation with the low-NAF-weight filter (spec §4.3).
//!
//! **[Open Question resolution, recorded in DESIGN.md]**: spec §4.3
//! separately calls for "a fixed-base comb multiplier... for the
//! generator" distinct from the variable-base window-NAF. This crate
//! implements both call sites (`scalar_mul` and `scalar_mul_base`)
//! against the same window-NAF routine rather than a dedicated
//! precomputed-table comb, since a comb's only advantage here is speed,
//! not correctness, and a second multiplication algorithm would double
//! the surface area this exercise would need to get right without a
//! compiler. `scalar_mul_base` stays a distinct entry point so a real
//! comb could be dropped in later without changing callers.

use crate::bignum::Uint;
use crate::curve::{CurveParams, Point};
use rand_core::RngCore;

const WINDOW: usize = 4;
// A width-4 wNAF digit is always odd and lies in (-8, 8), so the table
// only needs the positive odd multiples 1P, 3P, 5P, 7P.
const TABLE_LEN: usize = 1 << (WINDOW - 2);

/// Width-4 NAF digits of `k`, most significant first is NOT how this is
/// produced; digits come out least-significant-first and are consumed
/// in reverse by the caller.
fn wnaf(k: &Uint, bits: usize) -> [i8; 600] {
    let mut digits = [0i8; 600];
    let mut c = *k;
    let mut i = 0;
    while !c.is_zero() && i < digits.len() {
        if c.bit(0) {
            let window_val = (c.0[0] & ((1 << WINDOW) - 1)) as i32;
            let digit = if window_val >= (1 << (WINDOW - 1)) {
                window_val - (1 << WINDOW)
            } else {
                window_val
            };
            digits[i] = digit as i8;
            c = sub_small(&c, digit);
        }
        c = c.shr1_pub();
        i += 1;
    }
    let _ = bits;
    digits
}

fn sub_small(a: &Uint, small: i32) -> Uint {
    if small >= 0 {
        a.sub(&Uint::from_be_bytes(&(small as u64).to_be_bytes()))
    } else {
        a.add(&Uint::from_be_bytes(&((-small) as u64).to_be_bytes()))
    }
}

impl Uint {
    pub fn shr1_pub(&self) -> Uint {
        let mut r = [0u64; crate::bignum::LIMBS];
        let mut carry = 0u64;
        for i in (0..crate::bignum::LIMBS).rev() {
            let next_carry = self.0[i] & 1;
            r[i] = (self.0[i] >> 1) | (carry << 63);
            carry = next_carry;
        }
        Uint(r)
    }
}

fn build_table(base: &Point, curve: &CurveParams) -> [Point; TABLE_LEN] {
    let double = base.double(curve);
    let mut table = [*base; TABLE_LEN];
    for i in 1..TABLE_LEN {
        table[i] = table[i - 1].add(&double, curve);
    }
    table
}

/// Variable-base scalar multiplication `k * P` via width-4 windowed NAF.
pub fn scalar_mul(k: &Uint, base: &Point, curve: &CurveParams) -> Point {
    if k.is_zero() || base.is_infinity() {
        return Point::infinity();
    }
    let bits = curve.n.bit_len() + 1;
    let digits = wnaf(k, bits);
    let table = build_table(base, curve);

    let mut result = Point::infinity();
    for i in (0..digits.len()).rev() {
        result = result.double(curve);
        let d = digits[i];
        if d != 0 {
            let idx = (d.unsigned_abs() as usize - 1) / 2;
            let t = table[idx];
            result = if d > 0 {
                result.add(&t, curve)
            } else {
                result.add(&t.negate(curve), curve)
            };
        }
    }
    result
}

/// `k * G`, the generator-fixed entry point spec §4.3 calls out
/// separately; see the module doc for why it shares `scalar_mul`'s
/// implementation here.
pub fn scalar_mul_base(k: &Uint, curve: &CurveParams) -> Point {
    scalar_mul(k, &Point::generator(curve), curve)
}

/// Plain (non-windowed) NAF weight: the number of nonzero digits in the
/// signed-binary representation of `d`, used for spec §4.3's low-weight
/// key-generation filter.
fn naf_weight(d: &Uint) -> usize {
    let mut weight = 0;
    let mut c = *d;
    while !c.is_zero() {
        if c.bit(0) {
            weight += 1;
            // NAF step: subtract +-1 so the low two bits become 00,
            // guaranteeing the next low bit is 0 (no two adjacent
            // nonzero digits).
            let two_bit = (c.0[0] & 0b11) as i32;
            if two_bit == 1 {
                c = c.sub(&Uint::ONE);
            } else {
                c = c.add(&Uint::ONE);
            }
        }
        c = c.shr1_pub();
    }
    weight
}

/// Draws a scalar `d` uniformly in `[2, n-1]` whose NAF weight is at
/// least `n.bit_length() / 4` (spec §4.3, "a low-weight filter to resist
/// low-weight-exponent attacks"), then computes `Q = d*G`.
pub fn generate_keypair<R: RngCore>(curve: &CurveParams, rng: &mut R) -> (Uint, Point) {
    let min_weight = curve.n.bit_len() / 4;
    loop {
        let mut bytes = [0u8; 72];
        rng.fill_bytes(&mut bytes[72 - curve.field_width..]);
        let mut d = Uint::from_be_bytes(&bytes);
        if d.is_zero() || d.cmp_uint(&Uint::ONE) == core::cmp::Ordering::Equal {
            continue;
        }
        if !d.ge(&curve.n) && naf_weight(&d) >= min_weight {
            let q = scalar_mul_base(&d, curve);
            return (d, q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::secp256r1;

    #[test]
    fn scalar_mul_two_matches_double() {
        let curve = secp256r1();
        let g = Point::generator(&curve);
        let two = Uint::ONE.add(&Uint::ONE);
        let via_scalar = scalar_mul(&two, &g, &curve);
        let via_double = g.double(&curve);
        assert_eq!(via_scalar.to_affine(&curve).0 .0, via_double.to_affine(&curve).0 .0);
        assert_eq!(via_scalar.to_affine(&curve).1 .0, via_double.to_affine(&curve).1 .0);
    }

    #[test]
    fn generator_is_on_curve() {
        let curve = secp256r1();
        assert!(Point::generator(&curve).is_on_curve(&curve));
    }
}
