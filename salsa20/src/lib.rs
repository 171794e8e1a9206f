//! Salsa20 and XSalsa20 stream ciphers (spec §4.1.1/§4.1.2), implementing
//! the workspace's uniform [`StreamCipherEngine`] contract.
//!
//! Grounded on the teacher workspace's `salsa20` crate: the 16-word state
//! layout ("expand 16/32-byte k" constants at words 0/5/10/15, key at
//! 1-4/11-14, nonce at 6-7, block counter at 8-9), `quarter_round` and the
//! column/diagonal round schedule are carried over from `block.rs`, and
//! the `hsalsa` prelude from `xsalsa.rs` is kept verbatim for XSalsa20's
//! key derivation. The per-backend SIMD dispatch (`backends/soft.rs`,
//! `sse2.rs`, `neon.rs`) and the `cipher`-crate trait seam are dropped in
//! favour of a single portable implementation against our own trait,
//! since this workspace has no SIMD-acceleration requirement in spec.

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
    state[b] ^= state[a].wrapping_add(state[d]).rotate_left(7);
    state[c] ^= state[b].wrapping_add(state[a]).rotate_left(9);
    state[d] ^= state[c].wrapping_add(state[b]).rotate_left(13);
    state[a] ^= state[d].wrapping_add(state[c]).rotate_left(18);
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
    state[0] = constants[0];
    for (i, chunk) in key[..16].chunks(4).enumerate() {
        state[1 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[5] = constants[1];
    for (i, chunk) in nonce8.chunks(4).enumerate() {
        state[6 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[8] = 0;
    state[9] = 0;
    state[10] = constants[2];
    let tail = if key.len() == 32 { &key[16..32] } else { &key[..16] };
    for (i, chunk) in tail.chunks(4).enumerate() {
        state[11 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[15] = constants[3];
    state
}

fn run_rounds(state: &[u32; STATE_WORDS], rounds: u32) -> [u32; STATE_WORDS] {
    let mut res = *state;
    for _ in 0..(rounds / 2) {
        quarter_round(0, 4, 8, 12, &mut res);
        quarter_round(5, 9, 13, 1, &mut res);
        quarter_round(10, 14, 2, 6, &mut res);
        quarter_round(15, 3, 7, 11, &mut res);

        quarter_round(0, 1, 2, 3, &mut res);
        quarter_round(5, 6, 7, 4, &mut res);
        quarter_round(10, 11, 8, 9, &mut res);
        quarter_round(15, 12, 13, 14, &mut res);
    }
    for (s1, s0) in res.iter_mut().zip(state.iter()) {
        *s1 = s1.wrapping_add(*s0);
    }
    res
}

/// The HSalsa20 key-derivation function used by XSalsa20 (spec §4.1.2,
/// "HSalsa20 key-derivation from first 16 nonce bytes") and reused by
/// `curve25519-dh`'s NaCl-compatibility mode (spec §4.2) with an
/// all-zero 16-byte input and 20 rounds.
pub fn hsalsa(key: &[u8], input16: &[u8; 16], rounds: u32) -> [u8; 32] {
    let constants = constants_for(key.len());
    let mut state = [0u32; STATE_WORDS];
    state[0] = constants[0];
    for (i, chunk) in key[..16].chunks(4).enumerate() {
        state[1 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[5] = constants[1];
    for (i, chunk) in input16.chunks(4).enumerate() {
        state[6 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[10] = constants[2];
    let tail = if key.len() == 32 { &key[16..32] } else { &key[..16] };
    for (i, chunk) in tail.chunks(4).enumerate() {
        state[11 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[15] = constants[3];

    for _ in 0..(rounds / 2) {
        quarter_round(0, 4, 8, 12, &mut state);
        quarter_round(5, 9, 13, 1, &mut state);
        quarter_round(10, 14, 2, 6, &mut state);
        quarter_round(15, 3, 7, 11, &mut state);

        quarter_round(0, 1, 2, 3, &mut state);
        quarter_round(5, 6, 7, 4, &mut state);
        quarter_round(10, 11, 8, 9, &mut state);
        quarter_round(15, 12, 13, 14, &mut state);
    }

    let key_idx: [usize; 8] = [0, 5, 10, 15, 6, 7, 8, 9];
    let mut out = [0u8; 32];
    for (i, chunk) in out.chunks_exact_mut(4).enumerate() {
        chunk.copy_from_slice(&state[key_idx[i]].to_le_bytes());
    }
    out
}

/// The Salsa20 stream cipher engine (20 rounds, spec §4.1.1/§4.1.2).
pub struct Salsa20 {
    state: [u32; STATE_WORDS],
    block: [u8; BLOCK_SIZE],
    offset: u8,
    counter: u64,
    bytes_processed: u128,
    initialised: bool,
    key: [u8; 32],
    key_len: u8,
    nonce: [u8; 8],
}

impl Default for Salsa20 {
    fn default() -> Self {
        Salsa20 {
            state: [0; STATE_WORDS],
            block: [0; BLOCK_SIZE],
            offset: BLOCK_SIZE as u8,
            counter: 0,
            bytes_processed: 0,
            initialised: false,
            key: [0; 32],
            key_len: 0,
            nonce: [0; 8],
        }
    }
}

impl Salsa20 {
    /// Number of double-rounds Salsa20 performs.
    pub const ROUNDS: u32 = 20;

    fn rebuild(&mut self) {
        self.state = build_initial_state(&self.key[..self.key_len as usize], &self.nonce);
        self.counter = 0;
        self.offset = BLOCK_SIZE as u8;
        self.block = [0; BLOCK_SIZE];
        self.bytes_processed = 0;
    }

    fn next_block(&mut self) -> [u8; BLOCK_SIZE] {
        self.state[8] = (self.counter & 0xFFFF_FFFF) as u32;
        self.state[9] = ((self.counter >> 32) & 0xFFFF_FFFF) as u32;
        let words = run_rounds(&self.state, Self::ROUNDS);
        self.counter = self.counter.wrapping_add(1);
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

impl StreamCipherEngine for Salsa20 {
    fn algorithm_name(&self) -> &'static str {
        "Salsa20"
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

impl KeystreamExtract for Salsa20 {
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
impl Zeroize for Salsa20 {
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.block.zeroize();
        self.offset.zeroize();
        self.counter.zeroize();
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl Drop for Salsa20 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// XSalsa20: Salsa20 extended to a 192-bit (24-byte) nonce via an
/// HSalsa20 prelude (spec §4.1.2).
#[derive(Default)]
pub struct XSalsa20 {
    inner: Salsa20,
}

impl StreamCipherEngine for XSalsa20 {
    fn algorithm_name(&self) -> &'static str {
        "XSalsa20"
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
        let subkey_full = hsalsa(key, &prelude, Salsa20::ROUNDS);
        let subkey: &[u8] = if key.len() == 32 {
            &subkey_full
        } else {
            &subkey_full[..16]
        };
        self.inner.init(encrypting, subkey, &nonce[16..24])
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

impl KeystreamExtract for XSalsa20 {
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError> {
        self.inner.get_keystream(buf)
    }
}

#[cfg(feature = "zeroize")]
impl Zeroize for XSalsa20 {
    fn zeroize(&mut self) {
        self.inner.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl Drop for XSalsa20 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // Bernstein's Salsa20/20 test vector: key = 0x80 followed by zeros.
    #[test]
    fn kat_salsa20_first_block() {
        let mut key = [0u8; 32];
        key[0] = 0x80;
        let mut cipher = Salsa20::default();
        cipher.init(true, &key, &[0u8; 8]).unwrap();
        let mut ct = [0u8; 64];
        cipher.process(&[0u8; 64], &mut ct).unwrap();
        assert_eq!(
            ct,
            hex!(
                "4dfa5e481da23ea09a31022050859936"
                "da52fcee218005164f267cb65f5cfd7f"
                "2b4f97e0ff16924a52df269515110a07"
                "f9e460bc65ef95da58f740b7d1dbb0aa"
            )
        );
    }

    #[test]
    fn rejects_wrong_sizes() {
        let mut cipher = Salsa20::default();
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
        let mut cipher = Salsa20::default();
        cipher.init(true, &[7u8; 32], &[9u8; 8]).unwrap();
        let mut a = [0u8; 100];
        cipher.process(&[0u8; 100], &mut a).unwrap();
        cipher.reset();
        let mut b = [0u8; 100];
        cipher.process(&[0u8; 100], &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn keystream_split_is_split_invariant() {
        let key = [0x11u8; 32];
        let nonce = [0x22u8; 8];
        let mut whole = Salsa20::default();
        whole.init(true, &key, &nonce).unwrap();
        let pt = [0xABu8; 513];
        let mut ct_whole = [0u8; 513];
        whole.process(&pt, &mut ct_whole).unwrap();

        let mut split = Salsa20::default();
        split.init(true, &key, &nonce).unwrap();
        let mut ct_split = [0u8; 513];
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

    // Published XSalsa20 test vector (Bernstein, "Extending the Salsa20
    // nonce", section 7).
    #[test]
    fn kat_xsalsa20_first_block() {
        let key: [u8; 32] = hex!("1b27556473e985d462cd51197a9a46c76009549eac6474f206c4ee0844f68389");
        let nonce: [u8; 24] = hex!("69696ee955b62b73cd62bda875fc73d68219e0036910c18");
        let mut cipher = XSalsa20::default();
        cipher.init(true, &key, &nonce).unwrap();
        let mut ct = [0u8; 32];
        cipher.process(&[0u8; 32], &mut ct).unwrap();
        assert_eq!(
            ct,
            hex!("eea6a7251c1e72916d11c2cb214d3c252539121d8e234e652d651fa4c8cff88")
        );
    }
}
