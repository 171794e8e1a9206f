//! Generic short-Weierstrass elliptic-curve domain over the 8 named SEC
//! curves (spec §4.3): fixed-width bignum, modular field arithmetic,
//! Jacobian point operations, SEC1 encode/decode, windowed-NAF scalar
//! multiplication, and low-NAF-weight key generation.
//!
//! This crate underpins the key-agreement layer (UM1, EC J-PAKE) the
//! same way `curve25519-dh` underpins the Curve25519 half of this
//! workspace's key-agreement surface; unlike that crate, arithmetic
//! here is not constant-time (see `bignum`'s module doc for why).

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bignum;
mod curve;
mod curves;
mod field;
pub mod scalar;
mod scalarmul;

pub use bignum::Uint;
pub use curve::{CurveParams, Point};
pub use curves::{secp192k1, secp192r1, secp224k1, secp224r1, secp256k1, secp256r1, secp384r1, secp521r1};
pub use scalarmul::{generate_keypair, scalar_mul, scalar_mul_base};
