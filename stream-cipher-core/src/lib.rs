//! Shared contract for the stream-cipher engines (C1) and the byte-level
//! utilities (C7) the rest of the workspace builds on.
//!
//! This crate plays the role the `cipher` crate plays for the teacher
//! workspace, except the contract here is the one the surrounding
//! specification actually calls for: explicit `init`/`process`/`reset`
//! methods with an `encrypting` flag and byte offsets, rather than the
//! `cipher` crate's `KeyIvInit`/`StreamCipher` traits. Engines still look
//! and feel like their teacher counterparts internally; only the outer
//! seam changes.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

#[cfg(feature = "zeroize")]
pub use zeroize;

mod error;
mod mac;
mod utils;

pub use error::CoreError;
pub use mac::{Digest, Hmac, HmacSha256, Mac, Sha256};
pub use utils::{ct_eq, le_absorb_u32_prefixed, read_u32_le, read_u64_le, write_u32_le, write_u64_le};

/// Uniform contract every stream-cipher engine in this workspace satisfies
/// (spec §4.1).
///
/// Implementors own their internal state arrays, counter/position and
/// keystream buffer. `init` is the only place sizes are validated; once
/// `initialised` every other method is infallible except for buffer-size
/// mismatches.
pub trait StreamCipherEngine {
    /// Human-readable algorithm name, e.g. `"ChaCha20"`.
    fn algorithm_name(&self) -> &'static str;

    /// The stride, in bytes, of the engine's bulk step (its `state_size`).
    fn state_size(&self) -> usize;

    /// Validate `key`/`nonce` sizes, derive the initial internal state and
    /// mark the engine initialised. `encrypting` has no bearing on the
    /// keystream itself (stream ciphers are symmetric) but is accepted so
    /// callers can assert intent and so future authenticated variants can
    /// branch on it.
    fn init(&mut self, encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError>;

    /// XOR `input` with the next `input.len()` keystream bytes into
    /// `output`. `input` and `output` must have equal length; any
    /// mismatch is `CoreError::BufferTooShort`. Carries a partial
    /// keystream block across calls so that splitting one logical call
    /// into several produces byte-identical output (spec §4.1.1).
    fn process(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CoreError>;

    /// Single-byte equivalent of [`process`](Self::process).
    fn return_byte(&mut self, input: u8) -> Result<u8, CoreError> {
        let mut out = [0u8];
        self.process(core::slice::from_ref(&input), &mut out)?;
        Ok(out[0])
    }

    /// Restore the state to the point immediately after `init` returned.
    /// Does not re-validate key/nonce; the caller's contract about nonce
    /// reuse is unaffected by this crate.
    fn reset(&mut self);

    /// Zero every key-derived array and mark the engine uninitialised,
    /// without giving up ownership (spec §4.1.2, "All engines MUST zero
    /// their key-derived arrays on a dedicated `clear()` method"). Unlike
    /// `Drop`, which only runs when the engine itself is dropped, this
    /// lets a caller wipe key material from a buffer they intend to keep
    /// using (e.g. reinitialising with a fresh key). The engine is
    /// `NotInitialised` afterwards, same as a freshly-constructed one.
    fn clear(&mut self);
}

/// Optional capability: emit raw keystream bytes without XOR-combining
/// them with any input (spec §4.1, `get_keystream`).
pub trait KeystreamExtract: StreamCipherEngine {
    /// Fill `buf` with the next `buf.len()` keystream bytes.
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError>;
}
