//! HC-256 stream cipher (spec §4.1.2), implementing the workspace's
//! uniform [`StreamCipherEngine`] contract.
//!
//! Grounded directly on the teacher workspace's `hc-256` crate: table
//! layout, `g1`/`g2`/`h1`/`h2` step functions, 1024-word `P`/`Q` tables and
//! the 4096-step priming loop are all carried over; only the outer seam
//! (explicit `init`/`process` rather than `cipher`'s `NewCipher`/
//! `StreamCipher`) and key/nonce flexibility (spec §6: key 16 or 32 bytes,
//! nonce 16–32 bytes with pad/truncate) change.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use stream_cipher_core::{CoreError, KeystreamExtract, StreamCipherEngine};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

const TABLE_SIZE: usize = 1024;
const TABLE_MASK: usize = TABLE_SIZE - 1;
const INIT_WORDS: usize = 2660;
const PRIMING_STEPS: usize = 4096;

#[inline]
fn f1(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline]
fn f2(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// The HC-256 stream cipher engine.
pub struct Hc256 {
    p_table: [u32; TABLE_SIZE],
    q_table: [u32; TABLE_SIZE],
    idx: u32,
    word: u32,
    offset: u8,
    initialised: bool,
    key: [u8; 32],
    key_len: u8,
    nonce: [u8; 32],
    nonce_len: u8,
}

impl Default for Hc256 {
    fn default() -> Self {
        Hc256 {
            p_table: [0; TABLE_SIZE],
            q_table: [0; TABLE_SIZE],
            idx: 0,
            word: 0,
            offset: 4,
            initialised: false,
            key: [0; 32],
            key_len: 0,
            nonce: [0; 32],
            nonce_len: 0,
        }
    }
}

impl Hc256 {
    /// Accepted key sizes in bytes.
    pub const KEY_SIZES: [usize; 2] = [16, 32];
    /// Accepted nonce-size range in bytes (shorter padded, longer
    /// truncated at `init`).
    pub const NONCE_RANGE: core::ops::RangeInclusive<usize> = 16..=32;

    #[inline]
    fn g1(&self, x: u32, y: u32) -> u32 {
        (x.rotate_right(10) ^ y.rotate_right(23))
            .wrapping_add(self.q_table[(x ^ y) as usize & TABLE_MASK])
    }

    #[inline]
    fn g2(&self, x: u32, y: u32) -> u32 {
        (x.rotate_right(10) ^ y.rotate_right(23))
            .wrapping_add(self.p_table[(x ^ y) as usize & TABLE_MASK])
    }

    #[inline]
    fn h1(&self, x: u32) -> u32 {
        self.q_table[(x & 0xff) as usize]
            .wrapping_add(self.q_table[(256 + ((x >> 8) & 0xff)) as usize])
            .wrapping_add(self.q_table[(512 + ((x >> 16) & 0xff)) as usize])
            .wrapping_add(self.q_table[(768 + ((x >> 24) & 0xff)) as usize])
    }

    #[inline]
    fn h2(&self, x: u32) -> u32 {
        self.p_table[(x & 0xff) as usize]
            .wrapping_add(self.p_table[(256 + ((x >> 8) & 0xff)) as usize])
            .wrapping_add(self.p_table[(512 + ((x >> 16) & 0xff)) as usize])
            .wrapping_add(self.p_table[(768 + ((x >> 24) & 0xff)) as usize])
    }

    fn gen_word(&mut self) -> u32 {
        let i = self.idx as usize;
        let j = i & TABLE_MASK;
        self.idx = (self.idx + 1) & (2 * TABLE_SIZE as u32 - 1);

        if i < TABLE_SIZE {
            self.p_table[j] = self.p_table[j]
                .wrapping_add(self.p_table[j.wrapping_sub(10) & TABLE_MASK])
                .wrapping_add(self.g1(
                    self.p_table[j.wrapping_sub(3) & TABLE_MASK],
                    self.p_table[j.wrapping_sub(1023) & TABLE_MASK],
                ));
            self.h1(self.p_table[j.wrapping_sub(12) & TABLE_MASK]) ^ self.p_table[j]
        } else {
            self.q_table[j] = self.q_table[j]
                .wrapping_add(self.q_table[j.wrapping_sub(10) & TABLE_MASK])
                .wrapping_add(self.g2(
                    self.q_table[j.wrapping_sub(3) & TABLE_MASK],
                    self.q_table[j.wrapping_sub(1023) & TABLE_MASK],
                ));
            self.h2(self.q_table[j.wrapping_sub(12) & TABLE_MASK]) ^ self.q_table[j]
        }
    }

    fn init_tables(&mut self) {
        let key_words = self.key_len as usize / 4;
        let nonce_words = self.nonce_len as usize / 4;

        let mut data = [0u32; INIT_WORDS];
        for i in 0..key_words {
            data[i] = u32::from_le_bytes([
                self.key[4 * i],
                self.key[4 * i + 1],
                self.key[4 * i + 2],
                self.key[4 * i + 3],
            ]);
        }
        for i in 0..nonce_words {
            data[i + key_words] = u32::from_le_bytes([
                self.nonce[4 * i],
                self.nonce[4 * i + 1],
                self.nonce[4 * i + 2],
                self.nonce[4 * i + 3],
            ]);
        }

        for i in (key_words + nonce_words)..INIT_WORDS {
            data[i] = f2(data[i - 2])
                .wrapping_add(data[i - 7])
                .wrapping_add(f1(data[i - 15]))
                .wrapping_add(data[i - 16])
                .wrapping_add(i as u32);
        }

        self.p_table.copy_from_slice(&data[512..512 + TABLE_SIZE]);
        self.q_table
            .copy_from_slice(&data[1536..1536 + TABLE_SIZE]);

        #[cfg(feature = "zeroize")]
        data.zeroize();

        self.idx = 0;
        for _ in 0..PRIMING_STEPS {
            self.gen_word();
        }
        self.idx = 0;
        self.word = 0;
        self.offset = 4;
    }
}

impl StreamCipherEngine for Hc256 {
    fn algorithm_name(&self) -> &'static str {
        "HC-256"
    }

    fn state_size(&self) -> usize {
        4
    }

    fn init(&mut self, _encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError> {
        if !Self::KEY_SIZES.contains(&key.len()) || nonce.is_empty() {
            return Err(CoreError::InvalidArgument);
        }

        self.key = [0; 32];
        self.key[..key.len()].copy_from_slice(key);
        self.key_len = key.len() as u8;

        self.nonce = [0; 32];
        let used_nonce_len = nonce.len().min(32);
        self.nonce[..used_nonce_len].copy_from_slice(&nonce[..used_nonce_len]);
        // Pad up to the key's own width so the schedule always sees a
        // whole number of 32-bit words; nonces longer than 32 bytes are
        // truncated per spec §6, nonces shorter than 16 are zero-padded.
        let padded_len = if used_nonce_len <= 16 { 16 } else { 32 };
        if used_nonce_len < 16 {
            return Err(CoreError::InvalidArgument);
        }
        self.nonce_len = padded_len as u8;

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

impl KeystreamExtract for Hc256 {
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
impl Zeroize for Hc256 {
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
impl Drop for Hc256 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_key_size() {
        let mut cipher = Hc256::default();
        assert_eq!(
            cipher.init(true, &[0u8; 24], &[0u8; 16]).unwrap_err(),
            CoreError::InvalidArgument
        );
    }

    #[test]
    fn rejects_undersized_nonce() {
        let mut cipher = Hc256::default();
        assert_eq!(
            cipher.init(true, &[0u8; 32], &[0u8; 4]).unwrap_err(),
            CoreError::InvalidArgument
        );
    }

    #[test]
    fn reset_restores_post_init_state() {
        let mut cipher = Hc256::default();
        cipher.init(true, &[3u8; 32], &[5u8; 32]).unwrap();
        let mut first = [0u8; 41];
        cipher.process(&[0u8; 41], &mut first).unwrap();
        cipher.reset();
        let mut second = [0u8; 41];
        cipher.process(&[0u8; 41], &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn keystream_split_is_split_invariant() {
        let key = [0x42u8; 32];
        let nonce = [0x24u8; 32];
        let mut whole = Hc256::default();
        whole.init(true, &key, &nonce).unwrap();
        let pt = [0xCDu8; 1009];
        let mut ct_whole = [0u8; 1009];
        whole.process(&pt, &mut ct_whole).unwrap();

        let mut split = Hc256::default();
        split.init(true, &key, &nonce).unwrap();
        let mut ct_split = [0u8; 1009];
        let mut off = 0;
        for chunk_len in [1usize, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377] {
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
