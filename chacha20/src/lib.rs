//! ChaCha8/12/20 and XChaCha20 stream ciphers (spec §4.1.1/§4.1.2),
//! implementing the workspace's uniform [`StreamCipherEngine`] contract.
//!
//! Grounded on the teacher workspace's `chacha20` crate: the state layout,
//! `quarter_round` and round schedule are carried over from
//! `backends/soft.rs`, and `hchacha` from `xchacha.rs` is kept for
//! XChaCha20's key derivation. Per spec §4.1.2 ChaCha takes an 8-byte
//! nonce with a 64-bit block counter at words 12-13 — the teacher's
//! `Legacy` [`variants::Variant`] shape rather than the IETF 96-bit-nonce/
//! 32-bit-counter layout its `default` feature ships — so the nonce
//! occupies words 14-15 here, matching `variants::Legacy::NONCE_INDEX`.
//! The per-backend SIMD dispatch and `rand_core`/`cipher`-crate trait
//! seams are dropped for a single portable implementation against our own
//! trait; the [SUPPLEMENT] `rng` feature keeps a thin rand_core-compatible
//! wrapper in the teacher's spirit (`rng.rs`) without the 4-block SIMD
//! buffering it used internally.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use stream_cipher_core::{CoreError, KeystreamExtract, StreamCipherEngine};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

const STATE_WORDS: usize = 16;
const BLOCK_SIZE: usize = 64;
const CONSTANTS_16: [u32; 4] = [0x6170_7865, 0x3120_646e, 0x7962_2d36, 0x6b20_6574];
const CONSTANTS_32: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Maximum bytes processable under one (key, nonce) pair before
/// [`CoreError::MaxBytesExceeded`] is raised (spec §3, "nonce reuse
/// imminent").
const MAX_BYTES: u128 = 1 << 70;

#[inline]
fn quarter_round(a: usize, b: usize, c: usize, d: usize, state: &mut [u32; STATE_WORDS]) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

fn constants_for(key_len: usize) -> [u32; 4] {
    if key_len == 32 {
        CONSTANTS_32
    } else {
        CONSTANTS_16
    }
}

fn build_initial_state(key: &[u8], nonce8: &[u8; 8]) -> [u32; STATE_WORDS] {
    let constants = constants_for(key.len());
    let mut state = [0u32; STATE_WORDS];
    state[..4].copy_from_slice(&constants);

    if key.len() == 32 {
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            state[4 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
    } else {
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            let word = u32::from_le_bytes(chunk.try_into().unwrap());
            state[4 + i] = word;
            state[8 + i] = word;
        }
    }

    state[12] = 0;
    state[13] = 0;
    for (i, chunk) in nonce8.chunks_exact(4).enumerate() {
        state[14 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state
}

fn run_rounds(state: &[u32; STATE_WORDS], rounds: u32) -> [u32; STATE_WORDS] {
    let mut res = *state;
    for _ in 0..rounds {
        quarter_round(0, 4, 8, 12, &mut res);
        quarter_round(1, 5, 9, 13, &mut res);
        quarter_round(2, 6, 10, 14, &mut res);
        quarter_round(3, 7, 11, 15, &mut res);

        quarter_round(0, 5, 10, 15, &mut res);
        quarter_round(1, 6, 11, 12, &mut res);
        quarter_round(2, 7, 8, 13, &mut res);
        quarter_round(3, 4, 9, 14, &mut res);
    }
    for (s1, s0) in res.iter_mut().zip(state.iter()) {
        *s1 = s1.wrapping_add(*s0);
    }
    res
}

/// The HChaCha function: adapts the ChaCha core function in the same
/// manner HSalsa20 adapts Salsa20 (used by XChaCha20's key derivation).
fn hchacha(key: &[u8], input16: &[u8; 16], rounds: u32) -> [u8; 32] {
    let mut state = [0u32; STATE_WORDS];
    state[..4].copy_from_slice(&constants_for(key.len()));
    for (i, chunk) in key.chunks_exact(4).enumerate() {
        state[4 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    for (i, chunk) in input16.chunks_exact(4).enumerate() {
        state[12 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }

    for _ in 0..rounds {
        quarter_round(0, 4, 8, 12, &mut state);
        quarter_round(1, 5, 9, 13, &mut state);
        quarter_round(2, 6, 10, 14, &mut state);
        quarter_round(3, 7, 11, 15, &mut state);

        quarter_round(0, 5, 10, 15, &mut state);
        quarter_round(1, 6, 11, 12, &mut state);
        quarter_round(2, 7, 8, 13, &mut state);
        quarter_round(3, 4, 9, 14, &mut state);
    }

    let mut out = [0u8; 32];
    for (chunk, val) in out[..16].chunks_exact_mut(4).zip(&state[..4]) {
        chunk.copy_from_slice(&val.to_le_bytes());
    }
    for (chunk, val) in out[16..].chunks_exact_mut(4).zip(&state[12..]) {
        chunk.copy_from_slice(&val.to_le_bytes());
    }
    out
}

/// A ChaCha stream cipher engine with a fixed round count (8, 12 or 20).
pub struct ChaCha<const ROUNDS: u32> {
    state: [u32; STATE_WORDS],
    block: [u8; BLOCK_SIZE],
    offset: u8,
    bytes_processed: u128,
    initialised: bool,
    key: [u8; 32],
    key_len: u8,
    nonce: [u8; 8],
}

/// ChaCha20 (RFC 8439 core, 20 rounds).
pub type ChaCha20 = ChaCha<20>;
/// ChaCha12 (reduced-round variant, 12 rounds).
pub type ChaCha12 = ChaCha<12>;
/// ChaCha8 (reduced-round variant, 8 rounds).
pub type ChaCha8 = ChaCha<8>;

impl<const ROUNDS: u32> Default for ChaCha<ROUNDS> {
    fn default() -> Self {
        ChaCha {
            state: [0; STATE_WORDS],
            block: [0; BLOCK_SIZE],
            offset: BLOCK_SIZE as u8,
            bytes_processed: 0,
            initialised: false,
            key: [0; 32],
            key_len: 0,
            nonce: [0; 8],
        }
    }
}

impl<const ROUNDS: u32> ChaCha<ROUNDS> {
    fn rebuild(&mut self) {
        self.state = build_initial_state(&self.key[..self.key_len as usize], &self.nonce);
        self.offset = BLOCK_SIZE as u8;
        self.block = [0; BLOCK_SIZE];
        self.bytes_processed = 0;
    }

    fn next_block(&mut self) -> [u8; BLOCK_SIZE] {
        let words = run_rounds(&self.state, ROUNDS / 2);
        let mut counter = (u64::from(self.state[13]) << 32) | u64::from(self.state[12]);
        counter = counter.wrapping_add(1);
        self.state[12] = counter as u32;
        self.state[13] = (counter >> 32) as u32;
        let mut out = [0u8; BLOCK_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn check_budget(&mut self, additional: usize) -> Result<(), CoreError> {
        self.bytes_processed += additional as u128;
        if self.bytes_processed > MAX_BYTES {
            return Err(CoreError::MaxBytesExceeded);
        }
        Ok(())
    }
}

impl<const ROUNDS: u32> StreamCipherEngine for ChaCha<ROUNDS> {
    fn algorithm_name(&self) -> &'static str {
        match ROUNDS {
            8 => "ChaCha8",
            12 => "ChaCha12",
            _ => "ChaCha20",
        }
    }

    fn state_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn init(&mut self, _encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError> {
        if key.len() != 16 && key.len() != 32 {
            return Err(CoreError::InvalidArgument);
        }
        if nonce.len() != 8 {
            return Err(CoreError::InvalidArgument);
        }
        self.key = [0; 32];
        self.key[..key.len()].copy_from_slice(key);
        self.key_len = key.len() as u8;
        self.nonce.copy_from_slice(nonce);
        self.rebuild();
        self.initialised = true;
        Ok(())
    }

    fn process(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CoreError> {
        if !self.initialised {
            return Err(CoreError::NotInitialised);
        }
        if input.len() != output.len() {
            return Err(CoreError::BufferTooShort);
        }
        self.check_budget(input.len())?;

        let mut i = 0;
        let len = input.len();

        while i < len && (self.offset as usize) < BLOCK_SIZE {
            output[i] = input[i] ^ self.block[self.offset as usize];
            self.offset += 1;
            i += 1;
        }

        while len - i >= BLOCK_SIZE {
            self.block = self.next_block();
            for b in 0..BLOCK_SIZE {
                output[i + b] = input[i + b] ^ self.block[b];
            }
            i += BLOCK_SIZE;
            self.offset = BLOCK_SIZE as u8;
        }

        if i < len {
            self.block = self.next_block();
            let mut b = 0usize;
            while i < len {
                output[i] = input[i] ^ self.block[b];
                b += 1;
                i += 1;
            }
            self.offset = b as u8;
        }

        Ok(())
    }

    fn reset(&mut self) {
        if self.initialised {
            self.rebuild();
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl<const ROUNDS: u32> KeystreamExtract for ChaCha<ROUNDS> {
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError> {
        if !self.initialised {
            return Err(CoreError::NotInitialised);
        }
        self.check_budget(buf.len())?;
        let mut i = 0;
        while i < buf.len() && (self.offset as usize) < BLOCK_SIZE {
            buf[i] = self.block[self.offset as usize];
            self.offset += 1;
            i += 1;
        }
        while buf.len() - i >= BLOCK_SIZE {
            self.block = self.next_block();
            buf[i..i + BLOCK_SIZE].copy_from_slice(&self.block);
            i += BLOCK_SIZE;
            self.offset = BLOCK_SIZE as u8;
        }
        if i < buf.len() {
            self.block = self.next_block();
            let mut b = 0usize;
            while i < buf.len() {
                buf[i] = self.block[b];
                b += 1;
                i += 1;
            }
            self.offset = b as u8;
        }
        Ok(())
    }
}

#[cfg(feature = "zeroize")]
impl<const ROUNDS: u32> Zeroize for ChaCha<ROUNDS> {
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.block.zeroize();
        self.offset.zeroize();
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl<const ROUNDS: u32> Drop for ChaCha<ROUNDS> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// XChaCha20: ChaCha20 extended to a 192-bit (24-byte) nonce via an
/// HChaCha20 prelude (spec §4.1.2, same construction as XSalsa20).
#[derive(Default)]
pub struct XChaCha20 {
    inner: ChaCha20,
}

impl StreamCipherEngine for XChaCha20 {
    fn algorithm_name(&self) -> &'static str {
        "XChaCha20"
    }

    fn state_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn init(&mut self, encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError> {
        if key.len() != 16 && key.len() != 32 {
            return Err(CoreError::InvalidArgument);
        }
        if nonce.len() != 24 {
            return Err(CoreError::InvalidArgument);
        }
        let prelude: [u8; 16] = nonce[..16].try_into().unwrap();
        let subkey_full = hchacha(key, &prelude, 20);
        let subkey: &[u8] = if key.len() == 32 {
            &subkey_full
        } else {
            &subkey_full[..16]
        };
        // draft-irtf-cfrg-xchacha: first 4 bytes of the derived 8-byte
        // nonce are zero, the last 8 bytes of the 24-byte nonce follow.
        let mut derived_nonce = [0u8; 8];
        derived_nonce.copy_from_slice(&nonce[16..24]);
        self.inner.init(encrypting, subkey, &derived_nonce)
    }

    fn process(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CoreError> {
        self.inner.process(input, output)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

impl KeystreamExtract for XChaCha20 {
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError> {
        self.inner.get_keystream(buf)
    }
}

#[cfg(feature = "zeroize")]
impl Zeroize for XChaCha20 {
    fn zeroize(&mut self) {
        self.inner.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl Drop for XChaCha20 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// [SUPPLEMENT] A `rand_core`-compatible CSPRNG built on ChaCha20,
/// grounded on the teacher workspace's `rng.rs` (kept minimal: one block
/// of lookahead rather than the teacher's four-block SIMD buffer, since
/// this workspace has no SIMD backend to amortize).
#[cfg(feature = "rng")]
pub mod rng {
    use super::ChaCha20;
    use rand_core::{CryptoRng, Error, RngCore};
    use stream_cipher_core::{KeystreamExtract, StreamCipherEngine};

    /// A CSPRNG wrapping [`ChaCha20`]'s keystream.
    pub struct ChaChaRng {
        cipher: ChaCha20,
    }

    impl ChaChaRng {
        /// Seed the RNG from a 32-byte key and 8-byte stream identifier.
        pub fn from_seed(seed: [u8; 32], stream_id: [u8; 8]) -> Self {
            let mut cipher = ChaCha20::default();
            cipher
                .init(true, &seed, &stream_id)
                .expect("32-byte key and 8-byte nonce are always valid");
            ChaChaRng { cipher }
        }
    }

    impl RngCore for ChaChaRng {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.cipher.get_keystream(&mut buf).expect("initialised");
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.cipher.get_keystream(&mut buf).expect("initialised");
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.cipher.get_keystream(dest).expect("initialised");
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ChaChaRng {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // Bernstein's reference ChaCha20 keystream block for an all-zero
    // key/nonce/counter=0; this block is identical whether the nonce
    // occupies words 14-15 (this engine's 8-byte-nonce layout) or the
    // IETF 96-bit-nonce layout, since every word involved is zero.
    #[test]
    fn kat_chacha20_first_block() {
        let mut cipher = ChaCha20::default();
        cipher.init(true, &[0u8; 32], &[0u8; 8]).unwrap();
        let mut ct = [0u8; 64];
        cipher.process(&[0u8; 64], &mut ct).unwrap();
        assert_eq!(
            ct,
            hex!(
                "76b8e0ada0f13d90405d6ae55386bd28"
                "bdd219b8a08ded1aa836efcc8b770dc7"
                "da41597c5157488d7724e03fb8d84a37"
                "6a43b8f41518a11cc387b669b2ee6586"
            )
        );
    }

    #[test]
    fn rejects_wrong_sizes() {
        let mut cipher = ChaCha20::default();
        assert_eq!(
            cipher.init(true, &[0u8; 24], &[0u8; 8]).unwrap_err(),
            CoreError::InvalidArgument
        );
        assert_eq!(
            cipher.init(true, &[0u8; 32], &[0u8; 12]).unwrap_err(),
            CoreError::InvalidArgument
        );
    }

    #[test]
    fn reset_restores_post_init_state() {
        let mut cipher = ChaCha20::default();
        cipher.init(true, &[4u8; 32], &[6u8; 8]).unwrap();
        let mut a = [0u8; 100];
        cipher.process(&[0u8; 100], &mut a).unwrap();
        cipher.reset();
        let mut b = [0u8; 100];
        cipher.process(&[0u8; 100], &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn keystream_split_is_split_invariant() {
        let key = [0x33u8; 32];
        let nonce = [0x44u8; 8];
        let mut whole = ChaCha20::default();
        whole.init(true, &key, &nonce).unwrap();
        let pt = [0xEFu8; 517];
        let mut ct_whole = [0u8; 517];
        whole.process(&pt, &mut ct_whole).unwrap();

        let mut split = ChaCha20::default();
        split.init(true, &key, &nonce).unwrap();
        let mut ct_split = [0u8; 517];
        let mut off = 0;
        for chunk_len in [1usize, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144] {
            if off >= pt.len() {
                break;
            }
            let end = (off + chunk_len).min(pt.len());
            split.process(&pt[off..end], &mut ct_split[off..end]).unwrap();
            off = end;
        }
        if off < pt.len() {
            split.process(&pt[off..], &mut ct_split[off..]).unwrap();
        }
        assert_eq!(ct_whole, ct_split);
    }

    #[test]
    fn chacha8_and_chacha12_differ_from_chacha20() {
        let key = [9u8; 32];
        let nonce = [1u8; 8];
        let mut c8 = ChaCha8::default();
        c8.init(true, &key, &nonce).unwrap();
        let mut c12 = ChaCha12::default();
        c12.init(true, &key, &nonce).unwrap();
        let mut c20 = ChaCha20::default();
        c20.init(true, &key, &nonce).unwrap();

        let mut out8 = [0u8; 64];
        let mut out12 = [0u8; 64];
        let mut out20 = [0u8; 64];
        c8.process(&[0u8; 64], &mut out8).unwrap();
        c12.process(&[0u8; 64], &mut out12).unwrap();
        c20.process(&[0u8; 64], &mut out20).unwrap();

        assert_ne!(out8, out12);
        assert_ne!(out12, out20);
    }
}
