//! Key-agreement protocols (spec §4.4, C4): X25519, UM1 and EC J-PAKE,
//! sharing one `CoreError` taxonomy with the rest of the workspace.
//!
//! X25519 itself needs no new code here: spec §4.4.1 is exactly
//! `curve25519-dh`'s existing `base`/`dh` (spec §4.2), re-exported under
//! this crate's key-agreement-facing names.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod jpake;
mod um1;

/// X25519 key-agreement (spec §4.4.1): `base`/`dh` from the Curve25519
/// layer (spec §4.2), re-exported as-is since X25519 key agreement is
/// just "output the 32-byte shared secret."
pub use curve25519_dh::{base as x25519_base, dh as x25519_dh, PublicKey as X25519PublicKey, SecretKey as X25519SecretKey, SharedSecret as X25519SharedSecret};

pub use jpake::{JpakeExport, JpakeSession, Round1Dto, Round2Dto, Round3Dto, Stage as JpakeStage, MAX_ID_LEN};
pub use um1::{initiate as um1_initiate, require_on_curve, respond as um1_respond, Um1Secret};
