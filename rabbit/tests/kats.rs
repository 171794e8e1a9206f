//! RFC 4503 Appendix A known-answer vectors (key-only; IV left at zero,
//! matching the teacher workspace's own `rabbit/tests/mod.rs` layout).

use rabbit::Rabbit;
use stream_cipher_core::StreamCipherEngine;

fn keystream(key: [u8; 16]) -> [u8; 48] {
    let mut cipher = Rabbit::default();
    cipher.init(true, &key, &[0u8; 8]).unwrap();
    let mut out = [0u8; 48];
    cipher.process(&[0u8; 48], &mut out).unwrap();
    out
}

#[test]
fn vector_a() {
    let key = [
        0xAC, 0xC3, 0x51, 0xDC, 0xF1, 0x62, 0xFC, 0x3B, 0xFE, 0x36, 0x3D, 0x2E, 0x29, 0x13, 0x28,
        0x91,
    ];
    let expected = [
        0x9C, 0x51, 0xE2, 0x87, 0x84, 0xC3, 0x7F, 0xE9, 0xA1, 0x27, 0xF6, 0x3E, 0xC8, 0xF3, 0x2D,
        0x3D, 0x19, 0xFC, 0x54, 0x85, 0xAA, 0x53, 0xBF, 0x96, 0x88, 0x5B, 0x40, 0xF4, 0x61, 0xCD,
        0x76, 0xF5, 0x5E, 0x4C, 0x4D, 0x20, 0x20, 0x3B, 0xE5, 0x8A, 0x50, 0x43, 0xDB, 0xFB, 0x73,
        0x74, 0x54, 0xE5,
    ];
    assert_eq!(keystream(key), expected);
}

#[test]
fn vector_b() {
    let key = [
        0x43, 0x00, 0x9B, 0xC0, 0x01, 0xAB, 0xE9, 0xE9, 0x33, 0xC7, 0xE0, 0x87, 0x15, 0x74, 0x95,
        0x83,
    ];
    let expected = [
        0x9B, 0x60, 0xD0, 0x02, 0xFD, 0x5C, 0xEB, 0x32, 0xAC, 0xCD, 0x41, 0xA0, 0xCD, 0x0D, 0xB1,
        0x0C, 0xAD, 0x3E, 0xFF, 0x4C, 0x11, 0x92, 0x70, 0x7B, 0x5A, 0x01, 0x17, 0x0F, 0xCA, 0x9F,
        0xFC, 0x95, 0x28, 0x74, 0x94, 0x3A, 0xAD, 0x47, 0x41, 0x92, 0x3F, 0x7F, 0xFC, 0x8B, 0xDE,
        0xE5, 0x49, 0x96,
    ];
    assert_eq!(keystream(key), expected);
}
