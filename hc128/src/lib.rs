//! HC-128 stream cipher (spec §4.1.2), implementing the workspace's
//! uniform [`StreamCipherEngine`] contract.
//!
//! Grounded on the teacher workspace's `hc-128` crate (table layout, `g1`/
//! `g2`/`h1`/`h2` step functions, 512-word `P`/`Q` tables) and cross-checked
//! against `hc-256`'s key-schedule shape for the `f1`/`f2` expansion that
//! the teacher's own `hc-128` crate was missing.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use stream_cipher_core::{CoreError, KeystreamExtract, StreamCipherEngine};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

const TABLE_SIZE: usize = 512;
const TABLE_MASK: usize = TABLE_SIZE - 1;
const INIT_WORDS: usize = 1280;
const KEY_WORDS: usize = 4;
const PRIMING_STEPS: usize = 1024;

/// The HC-128 stream cipher engine.
///
/// Caches its key and (zero-padded) nonce so that [`reset`] can restore
/// the exact post-`init` state rather than merely rewinding a cursor, per
/// spec §3's "resetting restores the exact post-init state" invariant.
///
/// [`reset`]: StreamCipherEngine::reset
pub struct Hc128 {
    p_table: [u32; TABLE_SIZE],
    q_table: [u32; TABLE_SIZE],
    idx: u32,
    word: u32,
    offset: u8,
    initialised: bool,
    key: [u8; 16],
    nonce: [u8; 16],
    nonce_len: u8,
}

impl Default for Hc128 {
    fn default() -> Self {
        Hc128 {
            p_table: [0; TABLE_SIZE],
            q_table: [0; TABLE_SIZE],
            idx: 0,
            word: 0,
            offset: 4,
            initialised: false,
            key: [0; 16],
            nonce: [0; 16],
            nonce_len: 0,
        }
    }
}

#[inline]
fn f1(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline]
fn f2(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

impl Hc128 {
    /// Key size in bytes (fixed).
    pub const KEY_SIZE: usize = 16;
    /// Maximum nonce size in bytes; shorter nonces are zero-padded.
    pub const MAX_NONCE_SIZE: usize = 16;

    #[inline]
    fn g1(x: u32, y: u32, z: u32) -> u32 {
        (x.rotate_right(10) ^ z.rotate_right(23)).wrapping_add(y.rotate_right(8))
    }

    #[inline]
    fn g2(x: u32, y: u32, z: u32) -> u32 {
        (x.rotate_left(10) ^ z.rotate_left(23)).wrapping_add(y.rotate_left(8))
    }

    #[inline]
    fn h1(&self, x: u32) -> u32 {
        self.q_table[(x & 0xff) as usize]
            .wrapping_add(self.q_table[(256 + ((x >> 8) & 0xff)) as usize])
    }

    #[inline]
    fn h2(&self, x: u32) -> u32 {
        self.p_table[(x & 0xff) as usize]
            .wrapping_add(self.p_table[(256 + ((x >> 8) & 0xff)) as usize])
    }

    fn gen_word(&mut self) -> u32 {
        let i = self.idx as usize;
        let j = i & TABLE_MASK;
        self.idx = (self.idx + 1) & (PRIMING_STEPS as u32 - 1);

        if i < TABLE_SIZE {
            let a = self.p_table[j.wrapping_sub(3) & TABLE_MASK];
            let b = self.p_table[j.wrapping_sub(10) & TABLE_MASK];
            let c = self.p_table[j.wrapping_sub(511) & TABLE_MASK];
            self.p_table[j] = self.p_table[j].wrapping_add(Self::g1(a, b, c));
            self.h1(self.p_table[j.wrapping_sub(12) & TABLE_MASK]) ^ self.p_table[j]
        } else {
            let a = self.q_table[j.wrapping_sub(3) & TABLE_MASK];
            let b = self.q_table[j.wrapping_sub(10) & TABLE_MASK];
            let c = self.q_table[j.wrapping_sub(511) & TABLE_MASK];
            self.q_table[j] = self.q_table[j].wrapping_add(Self::g2(a, b, c));
            self.h2(self.q_table[j.wrapping_sub(12) & TABLE_MASK]) ^ self.q_table[j]
        }
    }

    fn init_tables(&mut self) {
        let mut w = [0u32; INIT_WORDS];
        for i in 0..KEY_WORDS {
            w[i] = u32::from_le_bytes([
                self.key[4 * i],
                self.key[4 * i + 1],
                self.key[4 * i + 2],
                self.key[4 * i + 3],
            ]);
            w[i + KEY_WORDS] = w[i];
            w[i + 2 * KEY_WORDS] = u32::from_le_bytes([
                self.nonce[4 * i],
                self.nonce[4 * i + 1],
                self.nonce[4 * i + 2],
                self.nonce[4 * i + 3],
            ]);
            w[i + 3 * KEY_WORDS] = w[i + 2 * KEY_WORDS];
        }

        for i in (4 * KEY_WORDS)..INIT_WORDS {
            w[i] = f2(w[i - 2])
                .wrapping_add(w[i - 7])
                .wrapping_add(f1(w[i - 15]))
                .wrapping_add(w[i - 16])
                .wrapping_add(i as u32);
        }

        self.p_table.copy_from_slice(&w[256..256 + TABLE_SIZE]);
        self.q_table.copy_from_slice(&w[768..768 + TABLE_SIZE]);

        #[cfg(feature = "zeroize")]
        w.zeroize();

        self.idx = 0;
        for _ in 0..PRIMING_STEPS {
            self.gen_word();
        }
        self.idx = 0;
        self.offset = 4;
        self.word = 0;
    }
}

impl StreamCipherEngine for Hc128 {
    fn algorithm_name(&self) -> &'static str {
        "HC-128"
    }

    fn state_size(&self) -> usize {
        4
    }

    fn init(&mut self, _encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError> {
        if key.len() != Self::KEY_SIZE || nonce.len() > Self::MAX_NONCE_SIZE {
            return Err(CoreError::InvalidArgument);
        }

        self.key.copy_from_slice(key);
        self.nonce = [0; 16];
        self.nonce[..nonce.len()].copy_from_slice(nonce);
        self.nonce_len = nonce.len() as u8;

        self.init_tables();
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
        let mut word = self.word;

        while i < len && (self.offset as usize) < 4 {
            output[i] = input[i] ^ ((word >> (self.offset * 8)) & 0xff) as u8;
            self.offset += 1;
            i += 1;
        }

        while len - i >= 4 {
            word = self.gen_word();
            for b in 0..4u8 {
                output[i + b as usize] = input[i + b as usize] ^ ((word >> (b * 8)) & 0xff) as u8;
            }
            i += 4;
            self.offset = 4;
        }

        if i < len {
            word = self.gen_word();
            let mut b = 0u8;
            while i < len {
                output[i] = input[i] ^ ((word >> (b * 8)) & 0xff) as u8;
                b += 1;
                i += 1;
            }
            self.offset = b;
        }

        self.word = word;
        Ok(())
    }

    fn reset(&mut self) {
        if self.initialised {
            self.init_tables();
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl KeystreamExtract for Hc128 {
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError> {
        if !self.initialised {
            return Err(CoreError::NotInitialised);
        }
        let mut i = 0;
        while i < buf.len() && (self.offset as usize) < 4 {
            buf[i] = ((self.word >> (self.offset * 8)) & 0xff) as u8;
            self.offset += 1;
            i += 1;
        }
        while buf.len() - i >= 4 {
            self.word = self.gen_word();
            buf[i..i + 4].copy_from_slice(&self.word.to_le_bytes());
            i += 4;
            self.offset = 4;
        }
        if i < buf.len() {
            self.word = self.gen_word();
            let mut b = 0u8;
            while i < buf.len() {
                buf[i] = ((self.word >> (b * 8)) & 0xff) as u8;
                b += 1;
                i += 1;
            }
            self.offset = b;
        }
        Ok(())
    }
}

#[cfg(feature = "zeroize")]
impl Zeroize for Hc128 {
    fn zeroize(&mut self) {
        self.p_table.zeroize();
        self.q_table.zeroize();
        self.idx.zeroize();
        self.word.zeroize();
        self.offset.zeroize();
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl Drop for Hc128 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // eSTREAM HC-128 KAT: key = 0x00×16, nonce = 0x00×16.
    // First 16 output bytes: 73 5C C9 D9 62 13 56 35 BF 7F 60 38 C1 6C B9 60
    #[test]
    fn kat_all_zero() {
        let mut cipher = Hc128::default();
        cipher.init(true, &[0u8; 16], &[0u8; 16]).unwrap();
        let pt = [0u8; 16];
        let mut ct = [0u8; 16];
        cipher.process(&pt, &mut ct).unwrap();
        assert_eq!(
            ct,
            [
                0x73, 0x5C, 0xC9, 0xD9, 0x62, 0x13, 0x56, 0x35, 0xBF, 0x7F, 0x60, 0x38, 0xC1, 0x6C,
                0xB9, 0x60,
            ]
        );
    }

    #[test]
    fn reset_restores_post_init_state() {
        let mut cipher = Hc128::default();
        cipher.init(true, &[7u8; 16], &[9u8; 16]).unwrap();
        let mut first = [0u8; 37];
        cipher.process(&[0u8; 37], &mut first).unwrap();

        cipher.reset();
        let mut second = [0u8; 37];
        cipher.process(&[0u8; 37], &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nonce_reuse_rejects_oversized_nonce() {
        let mut cipher = Hc128::default();
        assert_eq!(
            cipher.init(true, &[0u8; 16], &[0u8; 17]).unwrap_err(),
            CoreError::InvalidArgument
        );
    }

    #[test]
    fn keystream_split_is_split_invariant() {
        let key = [0x11u8; 16];
        let nonce = [0x22u8; 16];
        let mut whole = Hc128::default();
        whole.init(true, &key, &nonce).unwrap();
        let pt = [0xABu8; 997];
        let mut ct_whole = [0u8; 997];
        whole.process(&pt, &mut ct_whole).unwrap();

        let mut split = Hc128::default();
        split.init(true, &key, &nonce).unwrap();
        let mut ct_split = [0u8; 997];
        let mut off = 0;
        for chunk_len in [1usize, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610] {
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
