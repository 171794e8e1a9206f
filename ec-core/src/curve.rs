//! Short-Weierstrass point operations in Jacobian coordinates (spec
//! §4.3): add, double, negate, multiply, is-on-curve, is-infinity,
//! encode/decode per SEC1, normalization to affine.
//!
//! Grounded on the well-known Bernstein/Lange "Explicit-Formulas
//! Database" generic (arbitrary-`a`) Jacobian formulas `dbl-2007-bl` and
//! `add-2007-bl`, the same family the curve25519 ladder in this
//! workspace's `curve25519-dh` crate draws its arithmetic style from,
//! adapted here to `F(p)` for a runtime curve parameter rather than a
//! single fixed field.

use crate::bignum::Uint;
use crate::field::{add_mod, inv_mod, mul_mod, mul_small_mod, neg_mod, square_mod, sqrt_mod_p3mod4, sub_mod};
use stream_cipher_core::CoreError;

/// The fixed parameter set of one of the 8 named SEC curves (spec §4.3).
/// Values are represented pre-parsed into [`Uint`]; see `curves.rs` for
/// the literal SEC2 §2 encodings this table is built from.
#[derive(Clone, Copy)]
pub struct CurveParams {
    /// Curve name, e.g. `"secp256r1"`.
    pub name: &'static str,
    pub(crate) p: Uint,
    pub(crate) a: Uint,
    pub(crate) b: Uint,
    pub(crate) gx: Uint,
    pub(crate) gy: Uint,
    /// Group order of the generator.
    pub n: Uint,
    /// Cofactor.
    pub h: u64,
    /// Width, in bytes, of one field element's fixed-width encoding.
    pub field_width: usize,
}

/// A point on the curve in Jacobian projective coordinates
/// (`x = X/Z^2`, `y = Y/Z^3`); `Z == 0` represents the point at
/// infinity.
#[derive(Clone, Copy)]
pub struct Point {
    pub(crate) x: Uint,
    pub(crate) y: Uint,
    pub(crate) z: Uint,
}

impl Point {
    pub fn infinity() -> Point {
        Point {
            x: Uint::ONE,
            y: Uint::ONE,
            z: Uint::ZERO,
        }
    }

    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    pub fn generator(curve: &CurveParams) -> Point {
        Point {
            x: curve.gx,
            y: curve.gy,
            z: Uint::ONE,
        }
    }

    /// Multiplies by the curve's cofactor via double-and-add. The
    /// cofactor is `1` for all 8 named curves this crate carries, so
    /// this is the identity in practice; kept general for spec §4.4.2's
    /// "ECDHC (cofactor multiplication form)" and §4.4.3's
    /// `cofactor·X ≠ ∞` ZKP-verification check.
    pub fn cofactor_mul(&self, curve: &CurveParams) -> Point {
        if curve.h == 1 {
            return *self;
        }
        let mut acc = Point::infinity();
        let mut base = *self;
        let mut n = curve.h;
        while n > 0 {
            if n & 1 == 1 {
                acc = acc.add(&base, curve);
            }
            base = base.double(curve);
            n >>= 1;
        }
        acc
    }

    pub fn negate(&self, curve: &CurveParams) -> Point {
        Point {
            x: self.x,
            y: neg_mod(&self.y, &curve.p),
            z: self.z,
        }
    }

    /// `dbl-2007-bl`, valid for any Weierstrass `a`.
    pub fn double(&self, curve: &CurveParams) -> Point {
        if self.is_infinity() || self.y.is_zero() {
            return Point::infinity();
        }
        let p = &curve.p;
        let xx = square_mod(&self.x, p);
        let yy = square_mod(&self.y, p);
        let yyyy = square_mod(&yy, p);
        let zz = square_mod(&self.z, p);

        let x_plus_yy = add_mod(&self.x, &yy, p);
        let s = mul_small_mod(&sub_mod(&square_mod(&x_plus_yy, p), &add_mod(&xx, &yyyy, p), p), 2, p);

        let zz2 = square_mod(&zz, p);
        let m = add_mod(&mul_small_mod(&xx, 3, p), &mul_mod(&curve.a, &zz2, p), p);

        let t = sub_mod(&square_mod(&m, p), &mul_small_mod(&s, 2, p), p);
        let x3 = t;
        let y3 = sub_mod(&mul_mod(&m, &sub_mod(&s, &t, p), p), &mul_small_mod(&yyyy, 8, p), p);
        let y_plus_z = add_mod(&self.y, &self.z, p);
        let z3 = sub_mod(&sub_mod(&square_mod(&y_plus_z, p), &yy, p), &zz, p);

        Point { x: x3, y: y3, z: z3 }
    }

    /// `add-2007-bl`, with the doubling and point-at-infinity cases
    /// dispatched out explicitly.
    pub fn add(&self, other: &Point, curve: &CurveParams) -> Point {
        if self.is_infinity() {
            return *other;
        }
        if other.is_infinity() {
            return *self;
        }
        let p = &curve.p;
        let z1z1 = square_mod(&self.z, p);
        let z2z2 = square_mod(&other.z, p);
        let u1 = mul_mod(&self.x, &z2z2, p);
        let u2 = mul_mod(&other.x, &z1z1, p);
        let s1 = mul_mod(&mul_mod(&self.y, &other.z, p), &z2z2, p);
        let s2 = mul_mod(&mul_mod(&other.y, &self.z, p), &z1z1, p);

        let h = sub_mod(&u2, &u1, p);
        let r = mul_small_mod(&sub_mod(&s2, &s1, p), 2, p);

        if h.is_zero() {
            if r.is_zero() {
                return self.double(curve);
            }
            return Point::infinity();
        }

        let i = square_mod(&mul_small_mod(&h, 2, p), p);
        let j = mul_mod(&h, &i, p);
        let v = mul_mod(&u1, &i, p);

        let x3 = sub_mod(&sub_mod(&square_mod(&r, p), &j, p), &mul_small_mod(&v, 2, p), p);
        let y3 = sub_mod(&mul_mod(&r, &sub_mod(&v, &x3, p), p), &mul_small_mod(&mul_mod(&s1, &j, p), 2, p), p);
        let z1_plus_z2 = add_mod(&self.z, &other.z, p);
        let z3 = mul_mod(&sub_mod(&sub_mod(&square_mod(&z1_plus_z2, p), &z1z1, p), &z2z2, p), &h, p);

        Point { x: x3, y: y3, z: z3 }
    }

    /// Normalizes to affine `(x, y)`. Infinity normalizes to `(0, 0)`;
    /// callers must check [`Point::is_infinity`] first if that
    /// distinction matters.
    pub fn to_affine(&self, curve: &CurveParams) -> (Uint, Uint) {
        if self.is_infinity() {
            return (Uint::ZERO, Uint::ZERO);
        }
        let p = &curve.p;
        let z_inv = inv_mod(&self.z, p);
        let z_inv2 = square_mod(&z_inv, p);
        let z_inv3 = mul_mod(&z_inv2, &z_inv, p);
        (mul_mod(&self.x, &z_inv2, p), mul_mod(&self.y, &z_inv3, p))
    }

    pub fn from_affine(x: Uint, y: Uint) -> Point {
        Point { x, y, z: Uint::ONE }
    }

    pub fn is_on_curve(&self, curve: &CurveParams) -> bool {
        if self.is_infinity() {
            return true;
        }
        let p = &curve.p;
        let (x, y) = self.to_affine(curve);
        let lhs = square_mod(&y, p);
        let rhs = add_mod(
            &add_mod(&mul_mod(&mul_mod(&x, &x, p), &x, p), &mul_mod(&curve.a, &x, p), p),
            &curve.b,
            p,
        );
        lhs == rhs
    }

    /// SEC1 compressed encoding: `0x02`/`0x03` tag byte + big-endian `x`.
    pub fn encode_compressed(&self, curve: &CurveParams, out: &mut [u8]) -> Result<(), CoreError> {
        if out.len() != curve.field_width + 1 {
            return Err(CoreError::BufferTooShort);
        }
        let (x, y) = self.to_affine(curve);
        let y_is_odd = y.bit(0);
        out[0] = if y_is_odd { 0x03 } else { 0x02 };
        x.to_be_bytes(&mut out[1..]);
        Ok(())
    }

    /// SEC1 uncompressed encoding: `0x04` + big-endian `x` + big-endian `y`.
    pub fn encode_uncompressed(&self, curve: &CurveParams, out: &mut [u8]) -> Result<(), CoreError> {
        if out.len() != 2 * curve.field_width + 1 {
            return Err(CoreError::BufferTooShort);
        }
        let (x, y) = self.to_affine(curve);
        out[0] = 0x04;
        x.to_be_bytes(&mut out[1..1 + curve.field_width]);
        y.to_be_bytes(&mut out[1 + curve.field_width..]);
        Ok(())
    }

    /// Decodes a SEC1 compressed or uncompressed point. Returns
    /// [`CoreError::InvalidArgument`] on a malformed tag/length or a
    /// compressed `x` with no corresponding curve point.
    pub fn decode(curve: &CurveParams, bytes: &[u8]) -> Result<Point, CoreError> {
        let w = curve.field_width;
        match bytes.first() {
            Some(0x04) if bytes.len() == 2 * w + 1 => {
                let x = Uint::from_be_bytes(&bytes[1..1 + w]);
                let y = Uint::from_be_bytes(&bytes[1 + w..]);
                let point = Point::from_affine(x, y);
                if !point.is_on_curve(curve) {
                    return Err(CoreError::InvalidArgument);
                }
                Ok(point)
            }
            Some(tag @ (0x02 | 0x03)) if bytes.len() == w + 1 => {
                let x = Uint::from_be_bytes(&bytes[1..]);
                let p = &curve.p;
                let rhs = add_mod(
                    &add_mod(&mul_mod(&mul_mod(&x, &x, p), &x, p), &mul_mod(&curve.a, &x, p), p),
                    &curve.b,
                    p,
                );
                let y = sqrt_mod_p3mod4(&rhs, p);
                if square_mod(&y, p) != rhs {
                    return Err(CoreError::InvalidArgument);
                }
                let want_odd = *tag == 0x03;
                let y = if y.bit(0) == want_odd { y } else { neg_mod(&y, p) };
                Ok(Point::from_affine(x, y))
            }
            _ => Err(CoreError::InvalidArgument),
        }
    }
}
