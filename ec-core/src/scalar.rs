//! Public scalar-field (`mod n`) arithmetic, exposed for protocols built
//! on this crate's point operations that also need plain modular integer
//! math over the group order — namely EC J-PAKE's zero-knowledge-proof
//! and key-derivation arithmetic (spec §4.4.3), which works with
//! passphrase-derived scalars and hash outputs reduced `mod n` rather
//! than curve points.

use crate::bignum::Uint;
use crate::field::{add_mod as field_add_mod, mul_mod as field_mul_mod, sub_mod as field_sub_mod};
use rand_core::RngCore;

/// `(a + b) mod n`.
pub fn add_mod(a: &Uint, b: &Uint, n: &Uint) -> Uint {
    field_add_mod(a, b, n)
}

/// `(a - b) mod n`.
pub fn sub_mod(a: &Uint, b: &Uint, n: &Uint) -> Uint {
    field_sub_mod(a, b, n)
}

/// `(a * b) mod n`.
pub fn mul_mod(a: &Uint, b: &Uint, n: &Uint) -> Uint {
    field_mul_mod(a, b, n)
}

/// Reduces an arbitrary big-endian byte string (passphrase bytes, a hash
/// output, ...) `mod modulus`, via the same bit-serial shift-and-subtract
/// technique [`field::mul_mod`](crate::field) uses to reduce a
/// double-width product. Byte strings longer than 72 bytes are rejected
/// by [`Uint::from_be_bytes`] truncating silently, so callers passing a
/// hash digest or a short passphrase are within bounds; this is not
/// meant for arbitrary-length input.
pub fn reduce_bytes_be(bytes: &[u8], modulus: &Uint) -> Uint {
    let value = Uint::from_be_bytes(bytes);
    let bits = value.bit_len();
    let mut r = Uint::ZERO;
    for i in (0..bits).rev() {
        r = r.shl1().or_bit0(value.bit(i) as u64);
        if r.ge(modulus) {
            r = r.sub(modulus);
        }
    }
    r
}

/// Draws a scalar uniformly in `[1, n-1]` by rejection sampling random
/// bytes against `n` (spec §4.4.3, "choose v ∈ [1, n-1] uniformly").
///
/// Only fills as many trailing bytes as `n`'s own bit length needs
/// (matching `scalarmul::generate_keypair`'s draw), not the full
/// 72-byte `Uint` backing store: `n` is at most 521 bits wide even for
/// the largest named curve, so drawing all 576 backing bits would make
/// almost every candidate land above `n` and the rejection loop would
/// not terminate in practice.
pub fn random_scalar<R: RngCore>(n: &Uint, rng: &mut R) -> Uint {
    let width = (n.bit_len() + 7) / 8;
    loop {
        let mut bytes = [0u8; 72];
        rng.fill_bytes(&mut bytes[72 - width..]);
        let candidate = Uint::from_be_bytes(&bytes);
        if !candidate.is_zero() && candidate.cmp_uint(n) == core::cmp::Ordering::Less {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::secp256r1;

    #[test]
    fn reduce_small_value_is_identity() {
        let n = secp256r1().n;
        let small = [0x05u8];
        assert_eq!(reduce_bytes_be(&small, &n), Uint::from_be_bytes(&small));
    }

    #[test]
    fn random_scalar_is_in_range() {
        let n = secp256r1().n;
        struct Counter(u8);
        impl RngCore for Counter {
            fn next_u32(&mut self) -> u32 {
                self.0 = self.0.wrapping_add(1);
                self.0 as u32
            }
            fn next_u64(&mut self) -> u64 {
                self.next_u32() as u64
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                for b in dest.iter_mut() {
                    self.0 = self.0.wrapping_add(1);
                    *b = self.0;
                }
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
                self.fill_bytes(dest);
                Ok(())
            }
        }
        let mut rng = Counter(0);
        let s = random_scalar(&n, &mut rng);
        assert!(!s.is_zero());
        assert_eq!(s.cmp_uint(&n), core::cmp::Ordering::Less);
    }
}
