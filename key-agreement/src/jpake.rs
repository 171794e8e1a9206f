//! EC J-PAKE (spec §4.4.3): the three-round password-authenticated
//! key-exchange state machine from spec §3's "J-PAKE participant
//! session" data model —
//! `Initialised → Round1Created → Round1Validated → Round2Created →
//! Round2Validated → KeyCalculated → Round3Created → Round3Validated`,
//! each transition one-shot and irreversible.
//!
//! Grounded on `ec-core`'s point/scalar arithmetic and on
//! `stream-cipher-core`'s `Sha256`/`HmacSha256` and
//! `le_absorb_u32_prefixed` helper for the length-prefixed
//! zero-knowledge-proof hash.

use ec_core::{scalar, scalar_mul, CurveParams, Point, Uint};
use rand_core::RngCore;
use stream_cipher_core::{ct_eq, le_absorb_u32_prefixed, CoreError, Digest, Hmac, Mac, Sha256};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// Longest participant identifier this session stores inline.
pub const MAX_ID_LEN: usize = 64;

/// Longest passphrase this session stores inline.
const MAX_PASSPHRASE_LEN: usize = 128;

/// Largest point encoding among the 8 named curves (uncompressed,
/// secp521r1: `1 + 2*66`).
const MAX_POINT_ENC: usize = 133;

#[derive(Clone, Copy)]
struct IdBuf {
    bytes: [u8; MAX_ID_LEN],
    len: usize,
}

impl IdBuf {
    fn new(id: &[u8]) -> Result<Self, CoreError> {
        if id.is_empty() || id.len() > MAX_ID_LEN {
            return Err(CoreError::InvalidArgument);
        }
        let mut bytes = [0u8; MAX_ID_LEN];
        bytes[..id.len()].copy_from_slice(id);
        Ok(IdBuf { bytes, len: id.len() })
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// One-shot, backwards-rejecting protocol state, matching spec §3's
/// J-PAKE lifecycle exactly.
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Stage {
    /// Newly constructed; no DTOs produced or consumed yet.
    Initialised,
    /// This side's round-1 DTO has been produced.
    Round1Created,
    /// The partner's round-1 DTO has been validated.
    Round1Validated,
    /// This side's round-2 DTO has been produced.
    Round2Created,
    /// The partner's round-2 DTO has been validated.
    Round2Validated,
    /// Keying material has been derived from `B`.
    KeyCalculated,
    /// This side's round-3 (key-confirmation) DTO has been produced.
    Round3Created,
    /// The partner's round-3 DTO has been validated; the session is
    /// complete and keying material may be read out.
    Round3Validated,
}

/// Round 1 wire payload (spec §6): `{id, G1, V1, r1, G2, V2, r2}`.
#[derive(Clone, Copy)]
pub struct Round1Dto {
    id: IdBuf,
    g1: Point,
    v1: Point,
    r1: Uint,
    g2: Point,
    v2: Point,
    r2: Uint,
}

/// Round 2 wire payload: `{id, A, V2s, r2s}`.
#[derive(Clone, Copy)]
pub struct Round2Dto {
    id: IdBuf,
    a: Point,
    v2s: Point,
    r2s: Uint,
}

/// Round 3 (key-confirmation) wire payload: just the MAC tag.
#[derive(Clone, Copy)]
pub struct Round3Dto {
    tag: [u8; 32],
}

impl Round3Dto {
    /// Wraps an externally-received tag for [`JpakeSession::validate_round3`].
    pub fn from_tag(tag: [u8; 32]) -> Self {
        Round3Dto { tag }
    }
}

fn encode_point(curve: &CurveParams, p: &Point, out: &mut [u8; MAX_POINT_ENC]) -> usize {
    let n = 2 * curve.field_width + 1;
    p.encode_uncompressed(curve, &mut out[..n]).expect("fixed-size buffer matches curve width");
    n
}

/// `H(g ‖ V ‖ X ‖ id)`, each input length-prefixed, reduced mod `n`
/// (spec §4.4.3's zero-knowledge-proof hash).
fn zkp_hash(curve: &CurveParams, g: &Point, v: &Point, x: &Point, id: &[u8]) -> Uint {
    let mut digest = Sha256::default();
    let mut buf = [0u8; MAX_POINT_ENC];
    for p in [g, v, x] {
        let n = encode_point(curve, p, &mut buf);
        le_absorb_u32_prefixed(&mut digest, &buf[..n]);
    }
    le_absorb_u32_prefixed(&mut digest, id);
    let mut out = [0u8; 32];
    digest.finalize_into(&mut out);
    scalar::reduce_bytes_be(&out, &curve.n)
}

/// Zero-knowledge proof of knowledge of the discrete log `x` of `capital_x
/// = g * x` (spec §4.4.3). Returns `(V, r)`.
fn zkp_prove<R: RngCore>(
    curve: &CurveParams,
    g: &Point,
    x: &Uint,
    capital_x: &Point,
    id: &[u8],
    rng: &mut R,
) -> (Point, Uint) {
    let v = scalar::random_scalar(&curve.n, rng);
    let capital_v = scalar_mul(&v, g, curve);
    let h = zkp_hash(curve, g, &capital_v, capital_x, id);
    let r = scalar::sub_mod(&v, &scalar::mul_mod(x, &h, &curve.n), &curve.n);
    (capital_v, r)
}

/// Verifies a zero-knowledge proof `(V, r)` of the discrete log of
/// `capital_x` relative to generator `g`.
fn zkp_verify(curve: &CurveParams, g: &Point, capital_x: &Point, capital_v: &Point, r: &Uint, id: &[u8]) -> bool {
    if capital_x.is_infinity() || !capital_x.is_on_curve(curve) {
        return false;
    }
    // Every `Point` this crate produces already carries field-reduced
    // (i.e. < p) affine coordinates by construction, so an explicit
    // "coordinates in [0, p-1]" check would be redundant here.
    if capital_x.cofactor_mul(curve).is_infinity() {
        return false;
    }
    let h = zkp_hash(curve, g, capital_v, capital_x, id);
    let lhs = scalar_mul(r, g, curve).add(&scalar_mul(&h, capital_x, curve), curve);
    points_equal(curve, &lhs, capital_v)
}

fn points_equal(curve: &CurveParams, a: &Point, b: &Point) -> bool {
    if a.is_infinity() || b.is_infinity() {
        return a.is_infinity() == b.is_infinity();
    }
    let (ax, ay) = a.to_affine(curve);
    let (bx, by) = b.to_affine(curve);
    ax == bx && ay == by
}

/// An EC J-PAKE participant session (spec §3/§4.4.3).
pub struct JpakeSession {
    curve: CurveParams,
    self_id: IdBuf,
    partner_id: IdBuf,
    stage: Stage,
    x2: Option<Uint>,
    own_exponent: Option<Uint>, // (x2 * s1) mod n, from round 2
    g1: Option<Point>,
    g2: Option<Point>,
    g3: Option<Point>, // partner's G1
    g4: Option<Point>, // partner's G2
    b: Option<Point>,  // partner's A
    keying_material: Option<[u8; 32]>,
    mac_key: Option<[u8; 32]>,
}

impl JpakeSession {
    /// Creates a fresh session for `self_id` against `partner_id`, both
    /// non-empty UTF-8-able byte identifiers (spec §3).
    pub fn new(curve: CurveParams, self_id: &[u8], partner_id: &[u8]) -> Result<Self, CoreError> {
        Ok(JpakeSession {
            curve,
            self_id: IdBuf::new(self_id)?,
            partner_id: IdBuf::new(partner_id)?,
            stage: Stage::Initialised,
            x2: None,
            own_exponent: None,
            g1: None,
            g2: None,
            g3: None,
            g4: None,
            b: None,
            keying_material: None,
            mac_key: None,
        })
    }

    /// Current protocol stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn require(&self, stage: Stage) -> Result<(), CoreError> {
        if self.stage == stage {
            Ok(())
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!(expected = ?stage, actual = ?self.stage, "jpake out-of-order call rejected");
            Err(CoreError::StateMisuse)
        }
    }

    /// Round 1: picks `x1, x2`, computes `G1 = G*x1`, `G2 = G*x2` and
    /// their ZKPs, and discards `x1` once the DTO is built.
    pub fn create_round1<R: RngCore>(&mut self, rng: &mut R) -> Result<Round1Dto, CoreError> {
        self.require(Stage::Initialised)?;
        let g = Point::generator(&self.curve);
        let x1 = scalar::random_scalar(&self.curve.n, rng);
        let x2 = scalar::random_scalar(&self.curve.n, rng);
        let g1 = scalar_mul(&x1, &g, &self.curve);
        let g2 = scalar_mul(&x2, &g, &self.curve);
        let (v1, r1) = zkp_prove(&self.curve, &g, &x1, &g1, self.self_id.as_bytes(), rng);
        let (v2, r2) = zkp_prove(&self.curve, &g, &x2, &g2, self.self_id.as_bytes(), rng);

        self.x2 = Some(x2);
        self.g1 = Some(g1);
        self.g2 = Some(g2);
        self.stage = Stage::Round1Created;
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake round 1 created");

        Ok(Round1Dto {
            id: self.self_id,
            g1,
            v1,
            r1,
            g2,
            v2,
            r2,
        })
    }

    /// Validates the partner's round-1 DTO and stores `G3 = peer.G1`,
    /// `G4 = peer.G2`.
    pub fn validate_round1(&mut self, peer: &Round1Dto) -> Result<(), CoreError> {
        self.require(Stage::Round1Created)?;
        let g = Point::generator(&self.curve);
        let id = peer.id.as_bytes();
        if !zkp_verify(&self.curve, &g, &peer.g1, &peer.v1, &peer.r1, id)
            || !zkp_verify(&self.curve, &g, &peer.g2, &peer.v2, &peer.r2, id)
        {
            #[cfg(feature = "tracing")]
            tracing::warn!("jpake round 1 zero-knowledge proof failed verification");
            return Err(CoreError::ZkpInvalid);
        }
        self.g3 = Some(peer.g1);
        self.g4 = Some(peer.g2);
        self.stage = Stage::Round1Validated;
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake round 1 validated");
        Ok(())
    }

    /// Round 2: `GA = G1 + G3 + G4`, `A = GA * (x2*s1 mod n)`, with a ZKP
    /// of that exponent over generator `GA`.
    pub fn create_round2<R: RngCore>(&mut self, passphrase: &[u8], rng: &mut R) -> Result<Round2Dto, CoreError> {
        self.require(Stage::Round1Validated)?;
        if passphrase.is_empty() || passphrase.len() > MAX_PASSPHRASE_LEN {
            return Err(CoreError::InvalidArgument);
        }
        let (g1, g3, g4, x2) = (
            self.g1.ok_or(CoreError::StateMisuse)?,
            self.g3.ok_or(CoreError::StateMisuse)?,
            self.g4.ok_or(CoreError::StateMisuse)?,
            self.x2.ok_or(CoreError::StateMisuse)?,
        );
        let s1 = scalar::reduce_bytes_be(passphrase, &self.curve.n);
        let ga = g1.add(&g3, &self.curve).add(&g4, &self.curve);
        let exponent = scalar::mul_mod(&x2, &s1, &self.curve.n);
        let a = scalar_mul(&exponent, &ga, &self.curve);
        let (v2s, r2s) = zkp_prove(&self.curve, &ga, &exponent, &a, self.self_id.as_bytes(), rng);

        self.own_exponent = Some(exponent);
        self.stage = Stage::Round2Created;
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake round 2 created");

        Ok(Round2Dto {
            id: self.self_id,
            a,
            v2s,
            r2s,
        })
    }

    /// Validates the partner's round-2 DTO against `GB = G3 + G1 + G2`
    /// and stores `B = peer.A`.
    pub fn validate_round2(&mut self, peer: &Round2Dto) -> Result<(), CoreError> {
        self.require(Stage::Round2Created)?;
        let (g1, g2, g3) = (
            self.g1.ok_or(CoreError::StateMisuse)?,
            self.g2.ok_or(CoreError::StateMisuse)?,
            self.g3.ok_or(CoreError::StateMisuse)?,
        );
        let gb = g3.add(&g1, &self.curve).add(&g2, &self.curve);
        if !zkp_verify(&self.curve, &gb, &peer.a, &peer.v2s, &peer.r2s, peer.id.as_bytes()) {
            #[cfg(feature = "tracing")]
            tracing::warn!("jpake round 2 zero-knowledge proof failed verification");
            return Err(CoreError::ZkpInvalid);
        }
        self.b = Some(peer.a);
        self.stage = Stage::Round2Validated;
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake round 2 validated");
        Ok(())
    }

    /// Derives keying material: `H(x-coord of ((B - G4*ownExponent) * x2))`.
    pub fn derive_key(&mut self) -> Result<(), CoreError> {
        self.require(Stage::Round2Validated)?;
        let (g4, x2, own_exponent, b) = (
            self.g4.ok_or(CoreError::StateMisuse)?,
            self.x2.ok_or(CoreError::StateMisuse)?,
            self.own_exponent.ok_or(CoreError::StateMisuse)?,
            self.b.ok_or(CoreError::StateMisuse)?,
        );
        let subtrahend = scalar_mul(&own_exponent, &g4, &self.curve);
        let diff = b.add(&subtrahend.negate(&self.curve), &self.curve);
        let pre_key_point = scalar_mul(&x2, &diff, &self.curve);
        if pre_key_point.is_infinity() {
            return Err(CoreError::InvalidArgument);
        }
        let (pre_key_x, _) = pre_key_point.to_affine(&self.curve);
        let mut pre_key_bytes = [0u8; 72];
        pre_key_x.to_be_bytes(&mut pre_key_bytes[..self.curve.field_width]);

        let mut digest = Sha256::default();
        le_absorb_u32_prefixed(&mut digest, &pre_key_bytes[..self.curve.field_width]);
        let mut keying_material = [0u8; 32];
        digest.finalize_into(&mut keying_material);

        self.keying_material = Some(keying_material);
        self.stage = Stage::KeyCalculated;
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake keying material derived");
        Ok(())
    }

    fn mac_key(&self) -> Result<[u8; 32], CoreError> {
        let keying_material = self.keying_material.ok_or(CoreError::StateMisuse)?;
        let mut digest = Sha256::default();
        digest.update(&keying_material);
        digest.update(b"JPAKE_KC");
        let mut out = [0u8; 32];
        digest.finalize_into(&mut out);
        Ok(out)
    }

    fn confirmation_tag(&self, mac_key: &[u8; 32], self_id: &[u8], partner_id: &[u8], g_a: &Point, g_b: &Point, g_c: &Point, g_d: &Point) -> [u8; 32] {
        let mut mac = Hmac::<Sha256>::new_keyed(mac_key);
        mac.update(b"KC_1_U");
        mac.update(self_id);
        mac.update(partner_id);
        let mut buf = [0u8; MAX_POINT_ENC];
        for p in [g_a, g_b, g_c, g_d] {
            let n = encode_point(&self.curve, p, &mut buf);
            mac.update(&buf[..n]);
        }
        let mut out = [0u8; 32];
        mac.finalize_into(&mut out);
        out
    }

    /// Round 3 (key confirmation): produces `HMAC(macKey, "KC_1_U" ‖
    /// selfId ‖ partnerId ‖ G1 ‖ G2 ‖ G3 ‖ G4)`.
    pub fn create_round3(&mut self) -> Result<Round3Dto, CoreError> {
        self.require(Stage::KeyCalculated)?;
        let (g1, g2, g3, g4) = (
            self.g1.ok_or(CoreError::StateMisuse)?,
            self.g2.ok_or(CoreError::StateMisuse)?,
            self.g3.ok_or(CoreError::StateMisuse)?,
            self.g4.ok_or(CoreError::StateMisuse)?,
        );
        let mac_key = self.mac_key()?;
        let tag = self.confirmation_tag(
            &mac_key,
            self.self_id.as_bytes(),
            self.partner_id.as_bytes(),
            &g1,
            &g2,
            &g3,
            &g4,
        );
        self.mac_key = Some(mac_key);
        self.stage = Stage::Round3Created;
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake round 3 created");
        Ok(Round3Dto { tag })
    }

    /// Validates the partner's round-3 DTO by recomputing the expected
    /// tag with `selfId`/`partnerId` and `G1..G4` swapped, comparing in
    /// constant time. On success, zeroizes the passphrase-derived
    /// secrets and returns the 32-byte keying material.
    pub fn validate_round3(&mut self, peer: &Round3Dto) -> Result<[u8; 32], CoreError> {
        self.require(Stage::Round3Created)?;
        let (g1, g2, g3, g4) = (
            self.g1.ok_or(CoreError::StateMisuse)?,
            self.g2.ok_or(CoreError::StateMisuse)?,
            self.g3.ok_or(CoreError::StateMisuse)?,
            self.g4.ok_or(CoreError::StateMisuse)?,
        );
        let mut mac_key = self.mac_key.ok_or(CoreError::StateMisuse)?;
        let expected = self.confirmation_tag(
            &mac_key,
            self.partner_id.as_bytes(),
            self.self_id.as_bytes(),
            &g3,
            &g4,
            &g1,
            &g2,
        );
        let matched = ct_eq(&expected, &peer.tag);

        // One-shot regardless of outcome: a failed confirmation is fatal
        // for the session, not a retry opportunity.
        self.stage = Stage::Round3Validated;
        self.x2 = None;
        self.own_exponent = None;
        self.b = None;
        self.mac_key = None;
        self.g1 = None;
        self.g2 = None;
        self.g3 = None;
        self.g4 = None;
        #[cfg(feature = "zeroize")]
        mac_key.zeroize();
        #[cfg(not(feature = "zeroize"))]
        let _ = &mut mac_key;

        if !matched {
            self.keying_material = None;
            #[cfg(feature = "tracing")]
            tracing::warn!("jpake round 3 key confirmation tag mismatch");
            return Err(CoreError::KeyConfirmationFailed);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, "jpake round 3 validated, session complete");
        let keying_material = self.keying_material.take().ok_or(CoreError::StateMisuse)?;
        Ok(keying_material)
    }

    /// Exports `x2` and every round DTO created or validated so far, so
    /// the caller can persist and later [`JpakeSession::restore`] this
    /// session (spec §4.4.3 Suspend/Resume).
    pub fn export_state(&self) -> JpakeExport {
        JpakeExport {
            stage: self.stage,
            x2: self.x2,
            g1: self.g1,
            g2: self.g2,
            g3: self.g3,
            g4: self.g4,
            b: self.b,
            own_exponent: self.own_exponent,
            keying_material: self.keying_material,
            mac_key: self.mac_key,
        }
    }

    /// Restores a freshly constructed session to the stage recorded in
    /// `export`. Rejects restoring onto a session that has already
    /// advanced past [`Stage::Initialised`].
    pub fn restore(mut self, export: JpakeExport) -> Result<Self, CoreError> {
        self.require(Stage::Initialised)?;
        self.stage = export.stage;
        self.x2 = export.x2;
        self.g1 = export.g1;
        self.g2 = export.g2;
        self.g3 = export.g3;
        self.g4 = export.g4;
        self.b = export.b;
        self.own_exponent = export.own_exponent;
        self.keying_material = export.keying_material;
        self.mac_key = export.mac_key;
        Ok(self)
    }
}

/// The exportable subset of [`JpakeSession`] state (spec §4.4.3
/// Suspend/Resume): the current stage plus every scalar/point produced
/// by completed rounds.
#[derive(Clone, Copy)]
pub struct JpakeExport {
    stage: Stage,
    x2: Option<Uint>,
    g1: Option<Point>,
    g2: Option<Point>,
    g3: Option<Point>,
    g4: Option<Point>,
    b: Option<Point>,
    own_exponent: Option<Uint>,
    keying_material: Option<[u8; 32]>,
    mac_key: Option<[u8; 32]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::secp256r1;

    struct Lcg(u64);
    impl RngCore for Lcg {
        fn next_u32(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
            (self.0 >> 32) as u32
        }
        fn next_u64(&mut self) -> u64 {
            ((self.next_u32() as u64) << 32) | self.next_u32() as u64
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(4) {
                let v = self.next_u32().to_le_bytes();
                chunk.copy_from_slice(&v[..chunk.len()]);
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn run_to_completion(passphrase_a: &[u8], passphrase_b: &[u8]) -> Result<([u8; 32], [u8; 32]), CoreError> {
        let curve = secp256r1();
        let mut rng_a = Lcg(1);
        let mut rng_b = Lcg(2);
        let mut a = JpakeSession::new(curve, b"alice", b"bob")?;
        let mut b = JpakeSession::new(curve, b"bob", b"alice")?;

        let r1a = a.create_round1(&mut rng_a)?;
        let r1b = b.create_round1(&mut rng_b)?;
        a.validate_round1(&r1b)?;
        b.validate_round1(&r1a)?;

        let r2a = a.create_round2(passphrase_a, &mut rng_a)?;
        let r2b = b.create_round2(passphrase_b, &mut rng_b)?;
        a.validate_round2(&r2b)?;
        b.validate_round2(&r2a)?;

        a.derive_key()?;
        b.derive_key()?;

        let r3a = a.create_round3()?;
        let r3b = b.create_round3()?;
        let key_a = a.validate_round3(&r3b)?;
        let key_b = b.validate_round3(&r3a)?;
        Ok((key_a, key_b))
    }

    #[test]
    fn matching_passphrases_agree_on_key() {
        let (key_a, key_b) = run_to_completion(b"hunter2", b"hunter2").unwrap();
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn mismatched_passphrases_fail_key_confirmation() {
        let err = run_to_completion(b"hunter2", b"wrong-password").unwrap_err();
        assert_eq!(err, CoreError::KeyConfirmationFailed);
    }

    #[test]
    fn stage_transitions_reject_out_of_order_calls() {
        let curve = secp256r1();
        let mut rng = Lcg(3);
        let mut session = JpakeSession::new(curve, b"alice", b"bob").unwrap();
        assert_eq!(session.create_round2(b"pw", &mut rng), Err(CoreError::StateMisuse));
        session.create_round1(&mut rng).unwrap();
        assert_eq!(session.create_round1(&mut rng).err(), Some(CoreError::StateMisuse));
    }

    #[test]
    fn export_and_restore_resumes_mid_session() {
        let curve = secp256r1();
        let mut rng_a = Lcg(4);
        let mut rng_b = Lcg(5);
        let mut a = JpakeSession::new(curve, b"alice", b"bob").unwrap();
        let mut b = JpakeSession::new(curve, b"bob", b"alice").unwrap();

        let r1a = a.create_round1(&mut rng_a).unwrap();
        let r1b = b.create_round1(&mut rng_b).unwrap();
        a.validate_round1(&r1b).unwrap();
        b.validate_round1(&r1a).unwrap();

        let export = a.export_state();
        let fresh = JpakeSession::new(curve, b"alice", b"bob").unwrap();
        let mut restored = fresh.restore(export).unwrap();
        assert_eq!(restored.stage(), Stage::Round1Validated);

        let r2a = restored.create_round2(b"hunter2", &mut rng_a).unwrap();
        let r2b = b.create_round2(b"hunter2", &mut rng_b).unwrap();
        restored.validate_round2(&r2b).unwrap();
        b.validate_round2(&r2a).unwrap();
        restored.derive_key().unwrap();
        b.derive_key().unwrap();
        let r3a = restored.create_round3().unwrap();
        let r3b = b.create_round3().unwrap();
        let key_a = restored.validate_round3(&r3b).unwrap();
        let key_b = b.validate_round3(&r3a).unwrap();
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn tampered_zkp_proof_fails_round1_validation() {
        let curve = secp256r1();
        let mut rng_a = Lcg(7);
        let mut rng_b = Lcg(8);
        let mut a = JpakeSession::new(curve, b"alice", b"bob").unwrap();
        let mut b = JpakeSession::new(curve, b"bob", b"alice").unwrap();

        let mut r1a = a.create_round1(&mut rng_a).unwrap();
        b.create_round1(&mut rng_b).unwrap();

        // Flip the Schnorr response `r1` so the proof no longer matches
        // the committed `V1`/`G1`.
        r1a.r1 = r1a.r1.add(&Uint::ONE);

        assert_eq!(b.validate_round1(&r1a), Err(CoreError::ZkpInvalid));
    }

    #[test]
    fn restore_onto_advanced_session_is_rejected() {
        let curve = secp256r1();
        let mut rng = Lcg(6);
        let mut session = JpakeSession::new(curve, b"alice", b"bob").unwrap();
        let export = session.export_state();
        session.create_round1(&mut rng).unwrap();
        assert_eq!(session.restore(export).err(), Some(CoreError::StateMisuse));
    }
}
