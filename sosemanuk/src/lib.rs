//! SOSEMANUK stream cipher (spec §4.1.2), implementing the workspace's
//! uniform [`StreamCipherEngine`] contract.
//!
//! No pack example ships a SOSEMANUK implementation, so this crate is
//! enriched from the published algorithm shape rather than ported from a
//! teacher file, following the workspace's [`stream-cipher-core`] seam
//! the way `hc128`/`hc256`/`rabbit` do. Two pieces follow the published
//! construction closely: the ten-word LFSR's multiply-by-`alpha`/
//! `alpha^-1` step (the same companion-matrix-over-GF(2^8) trick SNOW 2.0
//! uses, which the SOSEMANUK paper explicitly reuses) and the Serpent-
//! derived key schedule (the `w_i` recurrence with `PHI`, rotate-11, and
//! bitsliced S-box application in the S3,S2,S1,S0,S7,S6,S5,S4 order,
//! stopped at 100 words/25 groups instead of Serpent's own 132/33). The
//! FSM register-combination step is a good-faith reconstruction of the
//! "R1/R2 with LSB-conditioned mux and Serpent S-box nonlinearity" shape
//! spec §4.1.2 names, not a byte-exact port of the eSTREAM reference
//! (absent from the pack to ground it against) — see `DESIGN.md`.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use stream_cipher_core::{CoreError, KeystreamExtract, StreamCipherEngine};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

const BLOCK_SIZE: usize = 80;
const BLOCK_WORDS: usize = 20;
const SUBKEY_COUNT: usize = 100;
const PHI: u32 = 0x9E37_79B9;

/// The eight 4-bit Serpent S-boxes, applied bitslice during key
/// scheduling and (nibble-wise) in the FSM round function.
const SBOXES: [[u8; 16]; 8] = [
    [3, 8, 15, 1, 10, 6, 5, 11, 14, 13, 4, 2, 7, 0, 9, 12],
    [15, 12, 2, 7, 9, 0, 5, 10, 1, 11, 14, 8, 6, 13, 3, 4],
    [8, 6, 7, 9, 3, 12, 10, 15, 13, 1, 14, 4, 0, 11, 5, 2],
    [0, 15, 11, 8, 12, 9, 6, 3, 13, 1, 2, 4, 10, 7, 5, 14],
    [1, 15, 8, 3, 12, 0, 11, 6, 2, 5, 4, 10, 9, 14, 7, 13],
    [15, 5, 2, 11, 4, 10, 9, 12, 0, 3, 14, 8, 13, 6, 7, 1],
    [7, 2, 12, 5, 8, 4, 6, 11, 14, 9, 1, 15, 13, 3, 10, 0],
    [1, 13, 15, 0, 14, 8, 2, 11, 7, 4, 12, 10, 9, 3, 5, 6],
];

/// GF(2^8) reduction polynomial X^8+X^7+X^5+X^3+1 (SNOW 2.0 / SOSEMANUK).
const GF_POLY: u16 = 0x1A9;

fn gf_mul(a: u8, mut b: u8) -> u8 {
    let mut acc: u16 = 0;
    let mut a16 = a as u16;
    while b != 0 {
        if b & 1 != 0 {
            acc ^= a16;
        }
        a16 <<= 1;
        if a16 & 0x100 != 0 {
            a16 ^= GF_POLY;
        }
        b >>= 1;
    }
    acc as u8
}

fn gf_pow(base: u8, mut exp: u32) -> u8 {
    let mut result: u8 = 1;
    let mut b = base;
    while exp > 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, b);
        }
        b = gf_mul(b, b);
        exp >>= 1;
    }
    result
}

fn gf_inv(a: u8) -> u8 {
    // GF(2^8)* has order 255; a^254 = a^-1 for a != 0.
    gf_pow(a, 254)
}

/// Companion-matrix coefficients of the degree-4 polynomial defining
/// multiplication by `alpha` in GF(2^32), built from a GF(2^8) generator.
struct AlphaCoeffs {
    c3: u8,
    c2: u8,
    c1: u8,
    c0: u8,
}

fn alpha_coeffs() -> AlphaCoeffs {
    const BETA: u8 = 0x02;
    AlphaCoeffs {
        c3: gf_pow(BETA, 23),
        c2: gf_pow(BETA, 245),
        c1: gf_pow(BETA, 48),
        c0: gf_pow(BETA, 239),
    }
}

fn mul_alpha(word: u32, c: &AlphaCoeffs) -> u32 {
    let b = word.to_be_bytes();
    let (b3, b2, b1, b0) = (b[0], b[1], b[2], b[3]);
    let n3 = gf_mul(b3, c.c3) ^ b2;
    let n2 = gf_mul(b3, c.c2) ^ b1;
    let n1 = gf_mul(b3, c.c1) ^ b0;
    let n0 = gf_mul(b3, c.c0);
    u32::from_be_bytes([n3, n2, n1, n0])
}

fn div_alpha(word: u32, c: &AlphaCoeffs) -> u32 {
    let b = word.to_be_bytes();
    let (n3, n2, n1, n0) = (b[0], b[1], b[2], b[3]);
    let c0_inv = gf_inv(c.c0);
    let b3 = gf_mul(n0, c0_inv);
    let b2 = n3 ^ gf_mul(b3, c.c3);
    let b1 = n2 ^ gf_mul(b3, c.c2);
    let b0 = n1 ^ gf_mul(b3, c.c1);
    u32::from_be_bytes([b3, b2, b1, b0])
}

fn sbox_word(idx: usize, word: u32) -> u32 {
    let table = &SBOXES[idx % 8];
    let mut out = 0u32;
    for nibble in 0..8 {
        let shift = nibble * 4;
        let v = ((word >> shift) & 0xF) as usize;
        out |= (table[v] as u32) << shift;
    }
    out
}

/// Bitslice Serpent-style S-box application across four 32-bit words,
/// matching the key-schedule's treatment of one "round" of prekeys.
fn bitslice_sbox(idx: usize, words: &mut [u32; 4]) {
    let table = &SBOXES[idx % 8];
    let mut out = [0u32; 4];
    for bit in 0..32 {
        let nibble = ((words[0] >> bit) & 1)
            | (((words[1] >> bit) & 1) << 1)
            | (((words[2] >> bit) & 1) << 2)
            | (((words[3] >> bit) & 1) << 3);
        let mapped = table[nibble as usize] as u32;
        for (w, out_word) in out.iter_mut().enumerate() {
            *out_word |= ((mapped >> w) & 1) << bit;
        }
    }
    *words = out;
}

fn expand_key(padded_key: &[u8; 32]) -> [u32; SUBKEY_COUNT] {
    let mut w = [0u32; SUBKEY_COUNT + 8];
    for i in 0..8 {
        w[i] = u32::from_le_bytes([
            padded_key[4 * i],
            padded_key[4 * i + 1],
            padded_key[4 * i + 2],
            padded_key[4 * i + 3],
        ]);
    }
    for i in 8..(SUBKEY_COUNT + 8) {
        let v = w[i - 8] ^ w[i - 5] ^ w[i - 3] ^ w[i - 1] ^ PHI ^ (i as u32 - 8);
        w[i] = v.rotate_left(11);
    }

    let prekeys = &w[8..];
    let mut subkeys = [0u32; SUBKEY_COUNT];
    let sbox_order = [3usize, 2, 1, 0, 7, 6, 5, 4];
    for group in 0..(SUBKEY_COUNT / 4) {
        let mut block = [
            prekeys[4 * group],
            prekeys[4 * group + 1],
            prekeys[4 * group + 2],
            prekeys[4 * group + 3],
        ];
        bitslice_sbox(sbox_order[group % 8], &mut block);
        subkeys[4 * group..4 * group + 4].copy_from_slice(&block);
    }
    subkeys
}

/// The SOSEMANUK stream cipher engine.
pub struct Sosemanuk {
    lfsr: [u32; 10],
    r1: u32,
    r2: u32,
    subkeys: [u32; SUBKEY_COUNT],
    round: usize,
    block: [u8; BLOCK_SIZE],
    offset: u8,
    initialised: bool,
    key: [u8; 32],
    key_len: u8,
    nonce: [u8; 16],
    nonce_len: u8,
}

impl Default for Sosemanuk {
    fn default() -> Self {
        Sosemanuk {
            lfsr: [0; 10],
            r1: 0,
            r2: 0,
            subkeys: [0; SUBKEY_COUNT],
            round: 0,
            block: [0; BLOCK_SIZE],
            offset: BLOCK_SIZE as u8,
            initialised: false,
            key: [0; 32],
            key_len: 0,
            nonce: [0; 16],
            nonce_len: 0,
        }
    }
}

impl Sosemanuk {
    /// Accepted raw key-size range in bytes before padding (spec §4.1.2).
    pub const KEY_RANGE: core::ops::RangeInclusive<usize> = 8..=32;
    /// Accepted raw nonce-size range in bytes before padding.
    pub const NONCE_RANGE: core::ops::RangeInclusive<usize> = 4..=16;

    fn pad_key(key: &[u8]) -> [u8; 32] {
        let mut padded = [0u8; 32];
        padded[..key.len()].copy_from_slice(key);
        if key.len() < 32 {
            padded[key.len()] = 0x01;
        }
        padded
    }

    fn pad_nonce(nonce: &[u8]) -> [u8; 16] {
        let mut padded = [0u8; 16];
        padded[..nonce.len()].copy_from_slice(nonce);
        padded
    }

    fn fsm_sbox_index(&self) -> usize {
        self.round % 8
    }

    fn step_lfsr(&mut self, c: &AlphaCoeffs) -> u32 {
        let s0 = self.lfsr[0];
        let new = s0 ^ mul_alpha(self.lfsr[3], c) ^ div_alpha(self.lfsr[9], c);
        for i in 0..9 {
            self.lfsr[i] = self.lfsr[i + 1];
        }
        self.lfsr[9] = new;
        s0
    }

    /// Runs one FSM+LFSR step, returning one 32-bit keystream word.
    fn step(&mut self) -> u32 {
        let c = alpha_coeffs();
        let s_t = self.step_lfsr(&c);

        let mux_in = if self.r1 & 1 == 1 { self.lfsr[2] } else { 0 };
        let new_r1 = self.r2 ^ mux_in ^ self.subkeys[self.round % SUBKEY_COUNT];
        let new_r2 = sbox_word(self.fsm_sbox_index(), self.r1.rotate_left(7));

        let f = s_t.wrapping_add(self.r1) ^ self.r2;

        self.r1 = new_r1;
        self.r2 = new_r2;
        self.round = self.round.wrapping_add(1);

        f
    }

    fn rebuild(&mut self) {
        let padded_key = Self::pad_key(&self.key[..self.key_len as usize]);
        self.subkeys = expand_key(&padded_key);

        let padded_nonce = Self::pad_nonce(&self.nonce[..self.nonce_len as usize]);
        for i in 0..4 {
            self.lfsr[i] = u32::from_le_bytes([
                padded_nonce[4 * i],
                padded_nonce[4 * i + 1],
                padded_nonce[4 * i + 2],
                padded_nonce[4 * i + 3],
            ]);
        }
        for i in 4..10 {
            self.lfsr[i] = self.subkeys[i - 4] ^ self.subkeys[i + 6];
        }
        self.r1 = self.subkeys[90];
        self.r2 = self.subkeys[91];
        self.round = 0;

        // Priming: discard one full 20-word block before real output,
        // matching the priming discipline the HC-128/256 engines use.
        for _ in 0..BLOCK_WORDS {
            self.step();
        }

        self.offset = BLOCK_SIZE as u8;
        self.block = [0; BLOCK_SIZE];
    }

    fn next_block(&mut self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        for chunk in out.chunks_exact_mut(4) {
            chunk.copy_from_slice(&self.step().to_le_bytes());
        }
        out
    }
}

impl StreamCipherEngine for Sosemanuk {
    fn algorithm_name(&self) -> &'static str {
        "SOSEMANUK"
    }

    fn state_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn init(&mut self, _encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError> {
        if !Self::KEY_RANGE.contains(&key.len()) || !Self::NONCE_RANGE.contains(&nonce.len()) {
            return Err(CoreError::InvalidArgument);
        }
        self.key = [0; 32];
        self.key[..key.len()].copy_from_slice(key);
        self.key_len = key.len() as u8;
        self.nonce = [0; 16];
        self.nonce[..nonce.len()].copy_from_slice(nonce);
        self.nonce_len = nonce.len() as u8;
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

impl KeystreamExtract for Sosemanuk {
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError> {
        if !self.initialised {
            return Err(CoreError::NotInitialised);
        }
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
impl Zeroize for Sosemanuk {
    fn zeroize(&mut self) {
        self.lfsr.zeroize();
        self.r1.zeroize();
        self.r2.zeroize();
        self.subkeys.zeroize();
        self.block.zeroize();
        self.offset.zeroize();
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl Drop for Sosemanuk {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_round_trip() {
        let c = alpha_coeffs();
        for word in [0u32, 1, 0xDEAD_BEEF, 0xFFFF_FFFF, 0x1234_5678] {
            assert_eq!(div_alpha(mul_alpha(word, &c), &c), word);
            assert_eq!(mul_alpha(div_alpha(word, &c), &c), word);
        }
    }

    #[test]
    fn rejects_bad_key_and_nonce_sizes() {
        let mut cipher = Sosemanuk::default();
        assert_eq!(
            cipher.init(true, &[0u8; 4], &[0u8; 8]).unwrap_err(),
            CoreError::InvalidArgument
        );
        assert_eq!(
            cipher.init(true, &[0u8; 16], &[0u8; 20]).unwrap_err(),
            CoreError::InvalidArgument
        );
    }

    #[test]
    fn accepts_unpadded_key_and_nonce() {
        let mut cipher = Sosemanuk::default();
        cipher.init(true, &[0x42u8; 20], &[0x24u8; 10]).unwrap();
        let mut ct = [0u8; BLOCK_SIZE];
        cipher.process(&[0u8; BLOCK_SIZE], &mut ct).unwrap();
        assert!(ct.iter().any(|&b| b != 0));
    }

    #[test]
    fn reset_restores_post_init_state() {
        let mut cipher = Sosemanuk::default();
        cipher.init(true, &[3u8; 32], &[5u8; 16]).unwrap();
        let mut a = [0u8; 201];
        cipher.process(&[0u8; 201], &mut a).unwrap();
        cipher.reset();
        let mut b = [0u8; 201];
        cipher.process(&[0u8; 201], &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn keystream_split_is_split_invariant() {
        let key = [0x11u8; 32];
        let nonce = [0x22u8; 16];
        let mut whole = Sosemanuk::default();
        whole.init(true, &key, &nonce).unwrap();
        let pt = [0xCDu8; 421];
        let mut ct_whole = [0u8; 421];
        whole.process(&pt, &mut ct_whole).unwrap();

        let mut split = Sosemanuk::default();
        split.init(true, &key, &nonce).unwrap();
        let mut ct_split = [0u8; 421];
        let mut off = 0;
        for chunk_len in [1usize, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89] {
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
}
