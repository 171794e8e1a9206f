//! Encrypt-then-MAC authentication wrapper (spec §4.5 / C5): a decorator
//! around any [`StreamCipherEngine`] and [`Mac`] pair, following the
//! cipher-decorator shape `cfb-mode` uses in this workspace (a thin
//! struct holding the inner cipher plus a little position/byte-count
//! state, generic over the wrapped primitive) but built for the
//! Encrypt-then-MAC contract rather than CFB feedback.
//!
//! Write path: plaintext is enciphered and the *ciphertext* bytes are
//! simultaneously absorbed into the MAC. Read path: ciphertext bytes are
//! absorbed into the MAC first, then deciphered. On finish, both sides
//! absorb the item's canonical DTO bytes (everything except the MAC
//! field itself) before the tag is produced/compared.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use stream_cipher_core::{ct_eq, CoreError, Mac, StreamCipherEngine};

/// Write-direction half of the Encrypt-then-MAC decorator.
///
/// `E` enciphers; `M` authenticates the ciphertext it produces. Both are
/// owned outright rather than borrowed, matching the teacher's
/// `Cfb<C>`-style decorators that take ownership of the inner cipher.
pub struct EtmWriter<E, M> {
    cipher: E,
    mac: M,
    bytes_out: u64,
}

impl<E: StreamCipherEngine, M: Mac> EtmWriter<E, M> {
    /// Wraps an already-initialised cipher engine and a MAC already
    /// keyed via [`Mac::new_keyed`].
    pub fn new(cipher: E, mac: M) -> Self {
        EtmWriter {
            cipher,
            mac,
            bytes_out: 0,
        }
    }

    /// Enciphers `plaintext` into `output` and absorbs the produced
    /// ciphertext into the MAC. `plaintext.len()` must equal
    /// `output.len()`.
    pub fn write(&mut self, plaintext: &[u8], output: &mut [u8]) -> Result<(), CoreError> {
        self.cipher.process(plaintext, output)?;
        self.mac.update(output);
        self.bytes_out = self.bytes_out.wrapping_add(output.len() as u64);
        Ok(())
    }

    /// Total ciphertext bytes emitted so far; callers assert this
    /// against the item's declared external length before [`finish`](Self::finish)
    /// (spec §4.6.7, "assert cipher's bytes-in equals it").
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Absorbs `data` into the MAC without enciphering it. Used by the
    /// payload multiplexer (spec §4.6.4) for Frameshift's random-byte
    /// padding, which rides in cleartext on the wire but is still
    /// covered by the authentication tag.
    pub fn absorb(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    /// Absorbs `dto_bytes` (the item's canonical byte representation,
    /// excluding the MAC field itself) and writes the finalized tag to
    /// `tag_out`.
    pub fn finish(mut self, dto_bytes: &[u8], tag_out: &mut [u8]) -> Result<(), CoreError> {
        if tag_out.len() != M::OUTPUT_SIZE {
            return Err(CoreError::BufferTooShort);
        }
        self.mac.update(dto_bytes);
        self.mac.finalize_into(tag_out);
        Ok(())
    }
}

/// Read-direction half of the Encrypt-then-MAC decorator.
pub struct EtmReader<E, M> {
    cipher: E,
    mac: M,
    bytes_in: u64,
}

impl<E: StreamCipherEngine, M: Mac> EtmReader<E, M> {
    /// Wraps an already-initialised cipher engine and a MAC already
    /// keyed via [`Mac::new_keyed`].
    pub fn new(cipher: E, mac: M) -> Self {
        EtmReader {
            cipher,
            mac,
            bytes_in: 0,
        }
    }

    /// Absorbs `ciphertext` into the MAC, then deciphers it into
    /// `output`. `ciphertext.len()` must equal `output.len()`.
    pub fn read(&mut self, ciphertext: &[u8], output: &mut [u8]) -> Result<(), CoreError> {
        self.mac.update(ciphertext);
        self.cipher.process(ciphertext, output)?;
        self.bytes_in = self.bytes_in.wrapping_add(ciphertext.len() as u64);
        Ok(())
    }

    /// Total ciphertext bytes consumed so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Absorbs `data` into the MAC without deciphering it; the read-side
    /// counterpart of [`EtmWriter::absorb`].
    pub fn absorb(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    /// Absorbs `dto_bytes`, finalizes the MAC, and compares it in
    /// constant time against `expected_tag` (the item's stored
    /// `AuthenticationVerifiedOutput`). Returns
    /// [`CoreError::AuthenticationFailed`] on mismatch.
    pub fn finish(mut self, dto_bytes: &[u8], expected_tag: &[u8]) -> Result<(), CoreError> {
        self.mac.update(dto_bytes);
        let mut computed = [0u8; 64];
        if M::OUTPUT_SIZE > computed.len() {
            return Err(CoreError::BufferTooShort);
        }
        self.mac.finalize_into(&mut computed[..M::OUTPUT_SIZE]);
        if ct_eq(&computed[..M::OUTPUT_SIZE], expected_tag) {
            Ok(())
        } else {
            Err(CoreError::AuthenticationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salsa20::Salsa20;
    use stream_cipher_core::HmacSha256;

    fn make_pair() -> (Salsa20, Salsa20) {
        let key = [0x11u8; 32];
        let nonce = [0x22u8; 8];
        let mut enc = Salsa20::default();
        enc.init(true, &key, &nonce).unwrap();
        let mut dec = Salsa20::default();
        dec.init(false, &key, &nonce).unwrap();
        (enc, dec)
    }

    #[test]
    fn round_trip_succeeds_with_matching_tag() {
        let (enc, dec) = make_pair();
        let mac_key = [0x33u8; 32];
        let mut writer = EtmWriter::new(enc, HmacSha256::new_keyed(&mac_key));
        let plaintext = b"the message to authenticate and encrypt";
        let mut ciphertext = [0u8; 40];
        writer.write(plaintext, &mut ciphertext).unwrap();
        assert_eq!(writer.bytes_out(), 40);

        let dto_bytes = b"item-dto-without-mac-field";
        let mut tag = [0u8; 32];
        writer.finish(dto_bytes, &mut tag).unwrap();

        let mut reader = EtmReader::new(dec, HmacSha256::new_keyed(&mac_key));
        let mut recovered = [0u8; 40];
        reader.read(&ciphertext, &mut recovered).unwrap();
        assert_eq!(&recovered[..], &plaintext[..]);
        reader.finish(dto_bytes, &tag).unwrap();
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let (enc, dec) = make_pair();
        let mac_key = [0x44u8; 32];
        let mut writer = EtmWriter::new(enc, HmacSha256::new_keyed(&mac_key));
        let plaintext = b"another message";
        let mut ciphertext = [0u8; 15];
        writer.write(plaintext, &mut ciphertext).unwrap();
        let dto_bytes = b"dto";
        let mut tag = [0u8; 32];
        writer.finish(dto_bytes, &mut tag).unwrap();

        ciphertext[0] ^= 0x01;

        let mut reader = EtmReader::new(dec, HmacSha256::new_keyed(&mac_key));
        let mut recovered = [0u8; 15];
        reader.read(&ciphertext, &mut recovered).unwrap();
        assert_eq!(reader.finish(dto_bytes, &tag), Err(CoreError::AuthenticationFailed));
    }

    #[test]
    fn mismatched_dto_bytes_fails_authentication() {
        let (enc, dec) = make_pair();
        let mac_key = [0x55u8; 32];
        let mut writer = EtmWriter::new(enc, HmacSha256::new_keyed(&mac_key));
        let plaintext = b"short";
        let mut ciphertext = [0u8; 5];
        writer.write(plaintext, &mut ciphertext).unwrap();
        let mut tag = [0u8; 32];
        writer.finish(b"dto-v1", &mut tag).unwrap();

        let mut reader = EtmReader::new(dec, HmacSha256::new_keyed(&mac_key));
        let mut recovered = [0u8; 5];
        reader.read(&ciphertext, &mut recovered).unwrap();
        assert_eq!(reader.finish(b"dto-v2", &tag), Err(CoreError::AuthenticationFailed));
    }
}
