//! UM1, the NIST SP 800-56A §6.2.1.2 unified-model key-agreement scheme
//! (spec §4.4.2): cofactor-multiplication ECDH (`ECDHC`), ephemeral +
//! static contributions concatenated as `Ze ‖ Zs`, both zeroized after
//! concatenation.
//!
//! Grounded on `ec-core::scalarmul` for the underlying point
//! multiplication and on `curve25519-dh`'s `#[zeroize(drop)]` newtype
//! convention for the output secret.

use ec_core::{generate_keypair, scalar_mul, CurveParams, Point, Uint};
use rand_core::RngCore;
use stream_cipher_core::CoreError;

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// Largest `Ze ‖ Zs` encoding among the 8 named curves (secp521r1, 66
/// bytes per component).
const MAX_Z_LEN: usize = 132;

/// `Ze ‖ Zs`, field-width-encoded per component with no left-trimming
/// (spec §4.4.2). Zeroized on drop when the `zeroize` feature is on.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "zeroize", derive(Zeroize))]
#[cfg_attr(feature = "zeroize", zeroize(drop))]
pub struct Um1Secret {
    bytes: [u8; MAX_Z_LEN],
    len: usize,
}

impl Um1Secret {
    /// The `Ze ‖ Zs` bytes, `2 * curve.field_width` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Cofactor-multiplication ECDH: `h * (d * Q)`.
fn ecdhc(curve: &CurveParams, d: &Uint, q: &Point) -> Point {
    scalar_mul(d, q, curve).cofactor_mul(curve)
}

fn encode_z(curve: &CurveParams, ze: &Point, zs: &Point) -> Um1Secret {
    let w = curve.field_width;
    let mut bytes = [0u8; MAX_Z_LEN];
    let (ze_x, _) = ze.to_affine(curve);
    let (zs_x, _) = zs.to_affine(curve);
    ze_x.to_be_bytes(&mut bytes[..w]);
    zs_x.to_be_bytes(&mut bytes[w..2 * w]);
    Um1Secret { bytes, len: 2 * w }
}

/// Initiator U's side: generates the ephemeral keypair, computes
/// `Ze = ECDHC(d_e, Q_V)` and `Zs = ECDHC(d_U, Q_V)`, and returns
/// `(Z, Q_e)`.
pub fn initiate<R: RngCore>(curve: &CurveParams, d_u: &Uint, q_v: &Point, rng: &mut R) -> (Um1Secret, Point) {
    let (d_e, q_e) = generate_keypair(curve, rng);
    let ze = ecdhc(curve, &d_e, q_v);
    let zs = ecdhc(curve, d_u, q_v);
    (encode_z(curve, &ze, &zs), q_e)
}

/// Responder V's side: given the initiator's static public `Q_U` and
/// ephemeral public `Q_e`, computes `Ze = ECDHC(d_V, Q_e)` and
/// `Zs = ECDHC(d_V, Q_U)`.
pub fn respond(curve: &CurveParams, d_v: &Uint, q_u: &Point, q_e: &Point) -> Um1Secret {
    let ze = ecdhc(curve, d_v, q_e);
    let zs = ecdhc(curve, d_v, q_u);
    encode_z(curve, &ze, &zs)
}

/// Rejects a peer static/ephemeral public that isn't a valid curve point,
/// which `initiate`/`respond` themselves don't check (they trust callers
/// to validate inbound SEC1 bytes via [`ec_core::Point::decode`] first).
pub fn require_on_curve(curve: &CurveParams, point: &Point) -> Result<(), CoreError> {
    if point.is_on_curve(curve) && !point.is_infinity() {
        Ok(())
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!("um1 peer public point rejected: off-curve or infinity");
        Err(CoreError::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::secp256r1;

    struct NotRandom(u8);
    impl RngCore for NotRandom {
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

    #[test]
    fn initiator_and_responder_agree() {
        let curve = secp256r1();
        let mut rng = NotRandom(1);
        let (d_u, q_u) = generate_keypair(&curve, &mut rng);
        let (d_v, q_v) = generate_keypair(&curve, &mut rng);

        let (z_u, q_e) = initiate(&curve, &d_u, &q_v, &mut rng);
        let z_v = respond(&curve, &d_v, &q_u, &q_e);

        assert_eq!(z_u.as_bytes(), z_v.as_bytes());
        assert_eq!(z_u.as_bytes().len(), 64);
    }

    #[test]
    fn rejects_infinity_peer() {
        let curve = secp256r1();
        assert_eq!(require_on_curve(&curve, &Point::infinity()), Err(CoreError::InvalidArgument));
    }
}
