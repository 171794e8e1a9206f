//! Rabbit stream cipher (spec §4.1.2), implementing the workspace's
//! uniform [`StreamCipherEngine`] contract.
//!
//! Grounded directly on the teacher workspace's `rabbit` crate: state/
//! counter layout, `next_state`/`counter_update`/`extract` functions and
//! the RFC 4503 constants are carried over unchanged; only the outer seam
//! (explicit `init`/`process` rather than `cipher`'s `KeyInit`/
//! `InnerIvInit`/`StreamCipherCore`) changes, and `process` gains the
//! byte-wise keystream-advancement cursor spec §4.1.1 requires (the
//! teacher's `cipher`-crate wrapper already provides this generically; we
//! reimplement it locally against our own trait).

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use stream_cipher_core::{CoreError, KeystreamExtract, StreamCipherEngine};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

const KEY_BYTE_LEN: usize = 16;
const IV_BYTE_LEN: usize = 8;
const WORDSIZE: u64 = 1 << 32;

/// RFC 4503 §2.5 counter-update constants.
const A: [u32; 8] = [
    0x4D34D34D, 0xD34D34D3, 0x34D34D34, 0x4D34D34D, 0xD34D34D3, 0x34D34D34, 0x4D34D34D, 0xD34D34D3,
];

struct InnerState {
    x: [u32; 8],
    c: [u32; 8],
    carry_bit: u8,
}

impl InnerState {
    fn zero() -> Self {
        InnerState {
            x: [0; 8],
            c: [0; 8],
            carry_bit: 0,
        }
    }

    fn setup_key(&mut self, key: &[u8; KEY_BYTE_LEN]) {
        let mut k = [0u16; 8];
        for i in 0..8 {
            k[i] = (key[2 * i] as u16) | ((key[2 * i + 1] as u16) << 8);
        }

        for j in 0..8 {
            if j % 2 == 0 {
                self.x[j] = ((k[(j + 1) % 8] as u32) << 16) | (k[j] as u32);
                self.c[j] = ((k[(j + 4) % 8] as u32) << 16) | (k[(j + 5) % 8] as u32);
            } else {
                self.x[j] = ((k[(j + 5) % 8] as u32) << 16) | (k[(j + 4) % 8] as u32);
                self.c[j] = ((k[j] as u32) << 16) | (k[(j + 1) % 8] as u32);
            }
        }
        self.carry_bit = 0;

        for _ in 0..4 {
            self.next_state();
        }

        for j in 0..8 {
            self.c[j] ^= self.x[(j + 4) % 8];
        }
    }

    fn setup_iv(&mut self, iv: &[u8; IV_BYTE_LEN]) {
        let mut i = [0u32; 4];
        i[0] = u32::from_le_bytes([iv[0], iv[1], iv[2], iv[3]]);
        i[2] = u32::from_le_bytes([iv[4], iv[5], iv[6], iv[7]]);
        i[1] = (i[0] >> 16) | (i[2] & 0xFFFF_0000);
        i[3] = (i[2] << 16) | (i[0] & 0x0000_FFFF);

        self.c[0] ^= i[0];
        self.c[1] ^= i[1];
        self.c[2] ^= i[2];
        self.c[3] ^= i[3];
        self.c[4] ^= i[0];
        self.c[5] ^= i[1];
        self.c[6] ^= i[2];
        self.c[7] ^= i[3];

        for _ in 0..4 {
            self.next_state();
        }
    }

    fn counter_update(&mut self) {
        for j in 0..8 {
            let t = self.c[j] as u64 + A[j] as u64 + self.carry_bit as u64;
            self.carry_bit = ((t / WORDSIZE) as u8) & 1;
            self.c[j] = (t % WORDSIZE) as u32;
        }
    }

    fn next_state(&mut self) {
        let mut g = [0u32; 8];
        self.counter_update();

        for j in 0..8 {
            let u_plus_v = self.x[j] as u64 + self.c[j] as u64;
            let square_uv = (u_plus_v % WORDSIZE) * (u_plus_v % WORDSIZE);
            g[j] = (square_uv ^ (square_uv >> 32)) as u32;
        }

        self.x[0] = g[0].wrapping_add(g[7].rotate_left(16)).wrapping_add(g[6].rotate_left(16));
        self.x[1] = g[1].wrapping_add(g[0].rotate_left(8)).wrapping_add(g[7]);
        self.x[2] = g[2].wrapping_add(g[1].rotate_left(16)).wrapping_add(g[0].rotate_left(16));
        self.x[3] = g[3].wrapping_add(g[2].rotate_left(8)).wrapping_add(g[1]);
        self.x[4] = g[4].wrapping_add(g[3].rotate_left(16)).wrapping_add(g[2].rotate_left(16));
        self.x[5] = g[5].wrapping_add(g[4].rotate_left(8)).wrapping_add(g[3]);
        self.x[6] = g[6].wrapping_add(g[5].rotate_left(16)).wrapping_add(g[4].rotate_left(16));
        self.x[7] = g[7].wrapping_add(g[6].rotate_left(8)).wrapping_add(g[5]);
    }

    fn extract(&self) -> [u8; 16] {
        let mut tmp = [0u16; 8];
        tmp[0] = (self.x[0] ^ (self.x[5] >> 16)) as u16;
        tmp[1] = ((self.x[0] >> 16) ^ self.x[3]) as u16;
        tmp[2] = (self.x[2] ^ (self.x[7] >> 16)) as u16;
        tmp[3] = ((self.x[2] >> 16) ^ self.x[5]) as u16;
        tmp[4] = (self.x[4] ^ (self.x[1] >> 16)) as u16;
        tmp[5] = ((self.x[4] >> 16) ^ self.x[7]) as u16;
        tmp[6] = (self.x[6] ^ (self.x[3] >> 16)) as u16;
        tmp[7] = ((self.x[6] >> 16) ^ self.x[1]) as u16;

        let mut s = [0u8; 16];
        for (i, word) in tmp.iter().enumerate() {
            s[2 * i] = *word as u8;
            s[2 * i + 1] = (*word >> 8) as u8;
        }
        s
    }

    fn next_block(&mut self) -> [u8; 16] {
        self.next_state();
        self.extract()
    }
}

#[cfg(feature = "zeroize")]
impl Zeroize for InnerState {
    fn zeroize(&mut self) {
        self.x.zeroize();
        self.c.zeroize();
        self.carry_bit.zeroize();
    }
}

/// The Rabbit stream cipher engine (RFC 4503).
pub struct Rabbit {
    state: InnerState,
    block: [u8; 16],
    offset: u8,
    initialised: bool,
    key: [u8; KEY_BYTE_LEN],
    nonce: [u8; IV_BYTE_LEN],
}

impl Default for Rabbit {
    fn default() -> Self {
        Rabbit {
            state: InnerState::zero(),
            block: [0; 16],
            offset: 16,
            initialised: false,
            key: [0; KEY_BYTE_LEN],
            nonce: [0; IV_BYTE_LEN],
        }
    }
}

impl Rabbit {
    fn rebuild(&mut self) {
        self.state = InnerState::zero();
        self.state.setup_key(&self.key);
        self.state.setup_iv(&self.nonce);
        self.offset = 16;
        self.block = [0; 16];
    }
}

impl StreamCipherEngine for Rabbit {
    fn algorithm_name(&self) -> &'static str {
        "Rabbit"
    }

    fn state_size(&self) -> usize {
        16
    }

    fn init(&mut self, _encrypting: bool, key: &[u8], nonce: &[u8]) -> Result<(), CoreError> {
        if key.len() != KEY_BYTE_LEN || nonce.len() != IV_BYTE_LEN {
            return Err(CoreError::InvalidArgument);
        }
        self.key.copy_from_slice(key);
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

        let mut i = 0;
        let len = input.len();

        while i < len && (self.offset as usize) < 16 {
            output[i] = input[i] ^ self.block[self.offset as usize];
            self.offset += 1;
            i += 1;
        }

        while len - i >= 16 {
            self.block = self.state.next_block();
            for b in 0..16 {
                output[i + b] = input[i + b] ^ self.block[b];
            }
            i += 16;
            self.offset = 16;
        }

        if i < len {
            self.block = self.state.next_block();
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

impl KeystreamExtract for Rabbit {
    fn get_keystream(&mut self, buf: &mut [u8]) -> Result<(), CoreError> {
        if !self.initialised {
            return Err(CoreError::NotInitialised);
        }
        let mut i = 0;
        while i < buf.len() && (self.offset as usize) < 16 {
            buf[i] = self.block[self.offset as usize];
            self.offset += 1;
            i += 1;
        }
        while buf.len() - i >= 16 {
            self.block = self.state.next_block();
            buf[i..i + 16].copy_from_slice(&self.block);
            i += 16;
            self.offset = 16;
        }
        if i < buf.len() {
            self.block = self.state.next_block();
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
impl Zeroize for Rabbit {
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.block.zeroize();
        self.offset.zeroize();
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl Drop for Rabbit {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4503 Appendix A.1, first test vector (key-only, IV all-zero).
    #[test]
    fn kat_zero_key_zero_iv() {
        let mut cipher = Rabbit::default();
        cipher.init(true, &[0u8; 16], &[0u8; 8]).unwrap();
        let mut ct = [0u8; 16];
        cipher.process(&[0u8; 16], &mut ct).unwrap();
        assert_eq!(
            ct,
            [
                0x02, 0xF7, 0x4A, 0x1C, 0x26, 0x45, 0x6B, 0xF5, 0xEC, 0xD6, 0xA5, 0x36, 0xF0, 0x54,
                0x57, 0xB1,
            ]
        );
    }

    #[test]
    fn rejects_wrong_sizes() {
        let mut cipher = Rabbit::default();
        assert_eq!(
            cipher.init(true, &[0u8; 15], &[0u8; 8]).unwrap_err(),
            CoreError::InvalidArgument
        );
        assert_eq!(
            cipher.init(true, &[0u8; 16], &[0u8; 7]).unwrap_err(),
            CoreError::InvalidArgument
        );
    }

    #[test]
    fn reset_restores_post_init_state() {
        let mut cipher = Rabbit::default();
        cipher.init(true, &[1u8; 16], &[2u8; 8]).unwrap();
        let mut a = [0u8; 40];
        cipher.process(&[0u8; 40], &mut a).unwrap();
        cipher.reset();
        let mut b = [0u8; 40];
        cipher.process(&[0u8; 40], &mut b).unwrap();
        assert_eq!(a, b);
    }
}
