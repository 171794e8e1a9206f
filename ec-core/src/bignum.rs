//! Fixed-width big integer used as the field-element representation for
//! every curve in this crate (spec §4.3, "fixed-width bignum" ambient
//! requirement for the 8 named SEC curves, the largest of which,
//! secp521r1, needs 521 bits).
//!
//! Not constant-time: spec §4.2 mandates constant-time discipline for
//! the Curve25519 ladder specifically; §4.3 carries no such requirement
//! for the short-Weierstrass domain, so this module favours a simple,
//! easy-to-audit schoolbook implementation (bit-serial modular
//! reduction) over a production-grade constant-time bignum.

/// 9 limbs of 64 bits: 576 bits, enough headroom for the 521-bit
/// secp521r1 prime with room to spare for intermediate `2p` values.
pub(crate) const LIMBS: usize = 9;

/// A nonnegative integer less than `2^576`, little-endian limb order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Uint(pub(crate) [u64; LIMBS]);

impl Uint {
    pub const ZERO: Uint = Uint([0; LIMBS]);
    pub const ONE: Uint = {
        let mut limbs = [0u64; LIMBS];
        limbs[0] = 1;
        Uint(limbs)
    };

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&l| l == 0)
    }

    pub fn bit(&self, i: usize) -> bool {
        (self.0[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Highest set-bit index + 1, i.e. the bit length; `0` for zero.
    pub fn bit_len(&self) -> usize {
        for i in (0..LIMBS).rev() {
            if self.0[i] != 0 {
                return i * 64 + (64 - self.0[i].leading_zeros() as usize);
            }
        }
        0
    }

    /// Parses a big-endian byte string (at most 72 bytes) into a `Uint`.
    pub fn from_be_bytes(bytes: &[u8]) -> Uint {
        let mut limbs = [0u64; LIMBS];
        let mut byte_i = bytes.len();
        let mut limb_i = 0;
        while byte_i > 0 && limb_i < LIMBS {
            let chunk_start = byte_i.saturating_sub(8);
            let mut buf = [0u8; 8];
            let chunk = &bytes[chunk_start..byte_i];
            buf[8 - chunk.len()..].copy_from_slice(chunk);
            limbs[limb_i] = u64::from_be_bytes(buf);
            byte_i = chunk_start;
            limb_i += 1;
        }
        Uint(limbs)
    }

    /// Serialises to a fixed-width big-endian byte string of length
    /// `out.len()` (caller picks the curve's field-element width).
    pub fn to_be_bytes(&self, out: &mut [u8]) {
        out.fill(0);
        let n = out.len();
        for (limb_i, limb) in self.0.iter().enumerate() {
            let limb_bytes = limb.to_be_bytes();
            for (j, b) in limb_bytes.iter().enumerate() {
                let byte_pos = limb_i * 8 + (7 - j);
                if byte_pos < n {
                    out[n - 1 - byte_pos] = *b;
                }
            }
        }
    }

    pub fn cmp_uint(&self, other: &Uint) -> core::cmp::Ordering {
        for i in (0..LIMBS).rev() {
            match self.0[i].cmp(&other.0[i]) {
                core::cmp::Ordering::Equal => continue,
                ord => return ord,
            }
        }
        core::cmp::Ordering::Equal
    }

    pub fn ge(&self, other: &Uint) -> bool {
        self.cmp_uint(other) != core::cmp::Ordering::Less
    }

    /// Wrapping add; the caller is responsible for knowing the sum fits
    /// (every call site in this crate operates on values known to stay
    /// under `2p < 2^576`).
    pub fn add(&self, other: &Uint) -> Uint {
        let mut r = [0u64; LIMBS];
        let mut carry = 0u64;
        for i in 0..LIMBS {
            let (s1, c1) = self.0[i].overflowing_add(other.0[i]);
            let (s2, c2) = s1.overflowing_add(carry);
            r[i] = s2;
            carry = (c1 as u64) + (c2 as u64);
        }
        Uint(r)
    }

    /// `self - other`, assuming `self >= other`.
    pub fn sub(&self, other: &Uint) -> Uint {
        let mut r = [0u64; LIMBS];
        let mut borrow = 0i128;
        for i in 0..LIMBS {
            let diff = self.0[i] as i128 - other.0[i] as i128 - borrow;
            if diff < 0 {
                r[i] = (diff + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                r[i] = diff as u64;
                borrow = 0;
            }
        }
        Uint(r)
    }

    pub fn shl1(&self) -> Uint {
        let mut r = [0u64; LIMBS];
        let mut carry = 0u64;
        for i in 0..LIMBS {
            let next_carry = self.0[i] >> 63;
            r[i] = (self.0[i] << 1) | carry;
            carry = next_carry;
        }
        Uint(r)
    }

    pub fn or_bit0(&self, bit: u64) -> Uint {
        let mut r = *self;
        r.0[0] |= bit;
        r
    }

    /// Schoolbook multiply producing a double-width (18-limb) product.
    pub fn mul_wide(&self, other: &Uint) -> [u64; LIMBS * 2] {
        let mut r = [0u64; LIMBS * 2];
        for i in 0..LIMBS {
            let mut carry: u128 = 0;
            for j in 0..LIMBS {
                let idx = i + j;
                let prod = (self.0[i] as u128) * (other.0[j] as u128) + r[idx] as u128 + carry;
                r[idx] = prod as u64;
                carry = prod >> 64;
            }
            let mut k = i + LIMBS;
            while carry > 0 {
                let sum = r[k] as u128 + carry;
                r[k] = sum as u64;
                carry = sum >> 64;
                k += 1;
            }
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        let bytes = [0x12u8, 0x34, 0x56, 0x78];
        let u = Uint::from_be_bytes(&bytes);
        let mut out = [0u8; 4];
        u.to_be_bytes(&mut out);
        assert_eq!(out, bytes);
    }

    #[test]
    fn add_sub_inverse() {
        let a = Uint::from_be_bytes(&[0xff; 8]);
        let b = Uint::from_be_bytes(&[0x01; 8]);
        let sum = a.add(&b);
        assert_eq!(sum.sub(&b).cmp_uint(&a), core::cmp::Ordering::Equal);
    }

    #[test]
    fn bit_len_matches_leading_zeros() {
        let u = Uint::from_be_bytes(&[0x01]);
        assert_eq!(u.bit_len(), 1);
        let u = Uint::from_be_bytes(&[0xff]);
        assert_eq!(u.bit_len(), 8);
    }
}
