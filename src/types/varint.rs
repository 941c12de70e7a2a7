//! SQLite variable-length integers.
//!
//! A varint is 1 to 9 bytes, most significant group first. The first eight bytes carry
//! 7 bits each with the high bit as a continuation flag; a ninth byte, if reached,
//! contributes all 8 bits and always terminates the value.

use crate::types::MAX_VARINT_LEN;

const CONTINUATION_BIT: u8 = 0x80;
const LOW_SEVEN_BITS: u8 = 0x7F;

/// A decoded varint and the number of bytes it occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Varint {
    pub value: i64,
    pub len: usize,
}

/// Decode the varint starting at `start`.
///
/// Returns `Varint { value: 0, len: 0 }` when `start` is at or past the end of `bytes`.
/// The scan window is clamped to the bytes that remain, so a truncated varint yields
/// whatever was accumulated before the end.
pub fn decode(bytes: &[u8], start: usize) -> Varint {
    if start >= bytes.len() {
        return Varint { value: 0, len: 0 };
    }

    let window = &bytes[start..bytes.len().min(start + MAX_VARINT_LEN)];
    let mut value: u64 = 0;
    let mut len = 0;

    for (i, &byte) in window.iter().enumerate() {
        len += 1;
        if i == MAX_VARINT_LEN - 1 {
            value = (value << 8) | byte as u64;
            break;
        }
        value = (value << 7) | (byte & LOW_SEVEN_BITS) as u64;
        if byte & CONTINUATION_BIT == 0 {
            break;
        }
    }

    Varint {
        value: value as i64,
        len,
    }
}

/// Canonical (shortest) encoding of `value`.
pub fn encode(value: i64) -> Vec<u8> {
    let v = value as u64;

    // Anything wider than 56 bits needs the 9-byte form: 8 groups of 7 bits + a full byte.
    if v > 0x00ff_ffff_ffff_ffff {
        let mut buffer = vec![0u8; MAX_VARINT_LEN];
        buffer[8] = v as u8;
        let mut rest = v >> 8;
        for i in (0..8).rev() {
            buffer[i] = (rest as u8 & LOW_SEVEN_BITS) | CONTINUATION_BIT;
            rest >>= 7;
        }
        return buffer;
    }

    let mut groups = Vec::with_capacity(8);
    let mut rest = v;
    loop {
        groups.push(rest as u8 & LOW_SEVEN_BITS);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    groups.reverse();

    let last = groups.len() - 1;
    for group in &mut groups[..last] {
        *group |= CONTINUATION_BIT;
    }
    groups
}

/// Number of bytes `encode(value)` would produce.
pub fn encoded_len(value: i64) -> usize {
    let v = value as u64;
    if v > 0x00ff_ffff_ffff_ffff {
        return MAX_VARINT_LEN;
    }
    let bits = 64 - v.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}
